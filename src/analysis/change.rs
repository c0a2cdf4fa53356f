use tracing::{debug, warn};

use crate::analysis::types::{AnalysisError, CategoryChange, PositionCounts, TraderCategory};
use crate::data::types::PairedReport;

/// What to do with an instrument whose position fields fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Abort the analysis with the parse error.
    Fail,
    /// Log and leave the instrument out.
    Skip,
}

/// Week-over-week change per trader category for every instrument that
/// appears in both reports.
///
/// Instruments with a one-sided pair are skipped. Output keeps the input
/// instrument order, with categories in `TraderCategory::ALL` order.
pub fn analyze(
    records: &[PairedReport],
    policy: MalformedPolicy,
) -> Result<Vec<CategoryChange>, AnalysisError> {
    let mut changes = Vec::with_capacity(records.len() * TraderCategory::ALL.len());

    for record in records {
        if !record.is_complete() {
            debug!("Skipping {}: missing one of the two reports", record.instrument_id);
            continue;
        }

        match analyze_record(record) {
            Ok(rows) => changes.extend(rows),
            Err(err) if policy == MalformedPolicy::Skip => {
                warn!("Skipping {}: {}", record.instrument_id, err);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(changes)
}

fn analyze_record(record: &PairedReport) -> Result<Vec<CategoryChange>, AnalysisError> {
    let latest = PositionCounts::from_fields(&record.instrument_id, &record.latest_report)?;
    let previous = PositionCounts::from_fields(&record.instrument_id, &record.previous_report)?;

    Ok(TraderCategory::ALL
        .iter()
        .map(|&category| {
            let (latest_long_pct, latest_short_pct) = latest.get(category).percentages();
            let (previous_long_pct, previous_short_pct) = previous.get(category).percentages();

            let latest_net_pct = latest_long_pct - latest_short_pct;
            let previous_net_pct = previous_long_pct - previous_short_pct;

            CategoryChange {
                instrument_id: record.instrument_id.clone(),
                category,
                latest_long_pct,
                latest_short_pct,
                previous_long_pct,
                previous_short_pct,
                latest_net_pct,
                previous_net_pct,
                change_in_net_pct: latest_net_pct - previous_net_pct,
            }
        })
        .collect())
}
