use serde::Serialize;

use crate::analysis::change::{analyze, MalformedPolicy};
use crate::analysis::filter::{filter_assets, MatchMode};
use crate::analysis::summary::summarize;
use crate::analysis::types::{AnalysisError, CategoryChange, PositionSummary};
use crate::data::types::PairedReport;

/// Everything the dashboard shows for one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetAnalysis {
    pub changes: Vec<CategoryChange>,
    pub summary: Vec<PositionSummary>,
}

impl AssetAnalysis {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Filter -> analyze -> summarize for one asset query over the merged reports.
pub fn analyze_asset(
    records: &[PairedReport],
    query: Option<&str>,
    mode: MatchMode,
    policy: MalformedPolicy,
) -> Result<AssetAnalysis, AnalysisError> {
    let selected = filter_assets(records, query, mode);
    let changes = analyze(&selected, policy)?;
    let summary = summarize(&changes);

    Ok(AssetAnalysis { changes, summary })
}
