use serde::Serialize;

use crate::data::types::ReportFields;

/// Trader categories reported in the legacy COT layout, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TraderCategory {
    #[serde(rename = "Non-Commercial")]
    NonCommercial,
    #[serde(rename = "Commercial")]
    Commercial,
    #[serde(rename = "Retail")]
    Retail,
}

impl TraderCategory {
    pub const ALL: [TraderCategory; 3] = [
        TraderCategory::NonCommercial,
        TraderCategory::Commercial,
        TraderCategory::Retail,
    ];

    /// Prefix of this category's fields in the upstream dataset.
    pub fn field_prefix(&self) -> &'static str {
        match self {
            TraderCategory::NonCommercial => "noncomm_positions",
            TraderCategory::Commercial => "comm_positions",
            TraderCategory::Retail => "nonrept_positions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TraderCategory::NonCommercial => "Non-Commercial",
            TraderCategory::Commercial => "Commercial",
            TraderCategory::Retail => "Retail",
        }
    }

    pub fn long_field(&self) -> String {
        format!("{}_long_all", self.field_prefix())
    }

    pub fn short_field(&self) -> String {
        format!("{}_short_all", self.field_prefix())
    }
}

impl std::fmt::Display for TraderCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Long and short contract counts of one category in one report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LongShort {
    pub long: f64,
    pub short: f64,
}

impl LongShort {
    pub fn total(&self) -> f64 {
        self.long + self.short
    }

    /// (long %, short %) of the category total; both 0 when nothing is held.
    pub fn percentages(&self) -> (f64, f64) {
        let total = self.total();
        if total > 0.0 {
            (self.long / total * 100.0, self.short / total * 100.0)
        } else {
            (0.0, 0.0)
        }
    }
}

/// Typed view of the position fields of one report side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionCounts {
    pub non_commercial: LongShort,
    pub commercial: LongShort,
    pub retail: LongShort,
}

impl PositionCounts {
    pub fn get(&self, category: TraderCategory) -> LongShort {
        match category {
            TraderCategory::NonCommercial => self.non_commercial,
            TraderCategory::Commercial => self.commercial,
            TraderCategory::Retail => self.retail,
        }
    }

    /// Parse the six position fields. Missing fields count as 0; a present
    /// field that is not a non-negative number is rejected.
    pub fn from_fields(instrument_id: &str, fields: &ReportFields) -> Result<Self, AnalysisError> {
        let read = |category: TraderCategory| -> Result<LongShort, AnalysisError> {
            Ok(LongShort {
                long: read_count(instrument_id, fields, &category.long_field())?,
                short: read_count(instrument_id, fields, &category.short_field())?,
            })
        };

        Ok(Self {
            non_commercial: read(TraderCategory::NonCommercial)?,
            commercial: read(TraderCategory::Commercial)?,
            retail: read(TraderCategory::Retail)?,
        })
    }
}

fn read_count(instrument_id: &str, fields: &ReportFields, field: &str) -> Result<f64, AnalysisError> {
    let Some(value) = fields.get(field) else {
        return Ok(0.0);
    };

    match value.as_f64() {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(AnalysisError::InvalidNumericField {
            instrument_id: instrument_id.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Week-over-week change of one trader category for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChange {
    #[serde(rename = "market_and_exchange_names")]
    pub instrument_id: String,
    #[serde(rename = "group")]
    pub category: TraderCategory,
    pub latest_long_pct: f64,
    pub latest_short_pct: f64,
    pub previous_long_pct: f64,
    pub previous_short_pct: f64,
    pub latest_net_pct: f64,
    pub previous_net_pct: f64,
    pub change_in_net_pct: f64,
}

/// Long/short split of one category, normalized for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub category: TraderCategory,
    pub long_pct: f64,
    pub short_pct: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid numeric field {field} for {instrument_id}: {value:?}")]
    InvalidNumericField {
        instrument_id: String,
        field: String,
        value: String,
    },
}
