use std::fmt::Write;
use tracing::warn;

use crate::analysis::change::MalformedPolicy;
use crate::analysis::filter::MatchMode;
use crate::analysis::pipeline::{analyze_asset, AssetAnalysis};
use crate::analysis::types::{AnalysisError, CategoryChange, PositionSummary};
use crate::config::SectionConfig;
use crate::data::types::PairedReport;

const BAR_WIDTH: usize = 40;

pub struct SectionView {
    pub name: String,
    pub assets: Vec<AssetView>,
}

pub struct AssetView {
    pub label: String,
    pub analysis: AssetAnalysis,
}

/// Runs the per-asset pipeline for every configured section.
pub struct Dashboard<'a> {
    sections: &'a [SectionConfig],
    match_mode: MatchMode,
    policy: MalformedPolicy,
}

impl<'a> Dashboard<'a> {
    pub fn new(sections: &'a [SectionConfig], match_mode: MatchMode, policy: MalformedPolicy) -> Self {
        Self {
            sections,
            match_mode,
            policy,
        }
    }

    pub fn build(&self, records: &[PairedReport]) -> Result<Vec<SectionView>, AnalysisError> {
        let mut views = Vec::with_capacity(self.sections.len());

        for section in self.sections {
            let mut assets = Vec::with_capacity(section.assets.len());
            for asset in &section.assets {
                let found = records
                    .iter()
                    .any(|r| self.match_mode.matches(&r.instrument_id, &asset.source_id));
                if !found {
                    warn!("{} not present in either report", asset.source_id);
                }

                let analysis =
                    analyze_asset(records, Some(asset.source_id.as_str()), self.match_mode, self.policy)?;
                assets.push(AssetView {
                    label: asset.display_label().to_string(),
                    analysis,
                });
            }
            views.push(SectionView {
                name: section.name.clone(),
                assets,
            });
        }

        Ok(views)
    }
}

/// Every category change shown on the dashboard, in display order.
pub fn all_changes(views: &[SectionView]) -> Vec<CategoryChange> {
    views
        .iter()
        .flat_map(|section| &section.assets)
        .flat_map(|asset| asset.analysis.changes.iter().cloned())
        .collect()
}

pub fn render(views: &[SectionView]) -> String {
    let mut out = String::new();

    for section in views {
        let _ = writeln!(out, "=== {} ===", section.name);
        for asset in &section.assets {
            let _ = writeln!(out);
            let _ = writeln!(out, "--- {} ---", asset.label);
            if asset.analysis.is_empty() {
                let _ = writeln!(out, "No data in the last two reports");
                continue;
            }
            out.push_str(&render_change_table(&asset.analysis.changes));
            out.push_str(&render_position_chart(&asset.analysis.summary));
        }
        let _ = writeln!(out);
    }

    out
}

/// Two-column table: trader category and week-over-week net change.
pub fn render_change_table(changes: &[CategoryChange]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16}{:>14}", "Traders", "Net Change %");
    for change in changes {
        let _ = writeln!(out, "{:<16}{:>14.2}", change.category, change.change_in_net_pct);
    }
    out
}

/// Horizontal long/short bar per category.
pub fn render_position_chart(summary: &[PositionSummary]) -> String {
    let mut out = String::new();
    for row in summary {
        let long_cells = ((row.long_pct / 100.0) * BAR_WIDTH as f64).round() as usize;
        let long_cells = long_cells.min(BAR_WIDTH);
        let _ = writeln!(
            out,
            "{:<16}|{}{}| L {:>5.1}% / S {:>5.1}%",
            row.category,
            "#".repeat(long_cells),
            "-".repeat(BAR_WIDTH - long_cells),
            row.long_pct,
            row.short_pct,
        );
    }
    out
}
