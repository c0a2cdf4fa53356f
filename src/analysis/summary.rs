use tracing::warn;

use crate::analysis::types::{CategoryChange, LongShort, PositionSummary, TraderCategory};

/// Collapse category changes into one long/short split per category.
///
/// Latest long and short percentages are summed over every row of a category
/// and renormalized to 100. A category with nothing to sum reports 0/0.
pub fn summarize(changes: &[CategoryChange]) -> Vec<PositionSummary> {
    TraderCategory::ALL
        .iter()
        .map(|&category| {
            let sums = changes
                .iter()
                .filter(|change| change.category == category)
                .fold(LongShort::default(), |acc, change| LongShort {
                    long: acc.long + change.latest_long_pct,
                    short: acc.short + change.latest_short_pct,
                });

            if sums.total() <= 0.0 {
                warn!("No positions to summarize for {}", category);
            }

            let (long_pct, short_pct) = sums.percentages();
            PositionSummary {
                category,
                long_pct,
                short_pct,
            }
        })
        .collect()
}
