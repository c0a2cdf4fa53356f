use serde::Deserialize;

use crate::data::types::PairedReport;

/// How an asset query is matched against instrument identifiers.
/// Both modes ignore case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Identifier contains the query.
    Substring,
    /// Identifier equals the query.
    #[default]
    Exact,
}

impl MatchMode {
    pub fn matches(&self, instrument_id: &str, query: &str) -> bool {
        let id = instrument_id.to_lowercase();
        let query = query.to_lowercase();
        match self {
            MatchMode::Substring => id.contains(&query),
            MatchMode::Exact => id == query,
        }
    }
}

/// Records whose identifier matches `query`, in input order.
/// A missing or empty query selects everything.
pub fn filter_assets(
    records: &[PairedReport],
    query: Option<&str>,
    mode: MatchMode,
) -> Vec<PairedReport> {
    match query {
        Some(query) if !query.is_empty() => records
            .iter()
            .filter(|record| mode.matches(&record.instrument_id, query))
            .cloned()
            .collect(),
        _ => records.to_vec(),
    }
}
