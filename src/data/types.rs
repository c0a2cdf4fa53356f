use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field holding the instrument identifier, the join key between reports.
pub const INSTRUMENT_FIELD: &str = "market_and_exchange_names";
/// Date-valued field the upstream dataset is queried on.
pub const REPORT_DATE_FIELD: &str = "report_date_as_yyyy_mm_dd";

/// Scalar value of a single report field. The upstream source sends most
/// numbers as text, so conversion is left to whoever reads the field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Convert a JSON scalar. Nulls and nested values carry nothing usable.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(FieldValue::Bool(b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Bool(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Field name -> value for one report side of one instrument.
pub type ReportFields = BTreeMap<String, FieldValue>;

/// One upstream row: one instrument at one report date.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub instrument_id: String,
    pub report_date: Option<String>,
    /// Every other field the row carried, join key excluded.
    pub fields: ReportFields,
}

impl ReportRow {
    /// Build a row from a raw JSON object. Rows without an instrument
    /// identifier cannot be joined and yield `None`.
    pub fn from_json(object: Map<String, Value>) -> Option<Self> {
        let mut fields = ReportFields::new();
        let mut instrument_id = None;

        for (key, value) in object {
            if key == INSTRUMENT_FIELD {
                if let Value::String(id) = value {
                    instrument_id = Some(id);
                }
                continue;
            }
            if let Some(field) = FieldValue::from_json(value) {
                fields.insert(key, field);
            }
        }

        let report_date = match fields.get(REPORT_DATE_FIELD) {
            Some(FieldValue::Text(date)) => Some(date.clone()),
            _ => None,
        };

        Some(Self {
            instrument_id: instrument_id?,
            report_date,
            fields,
        })
    }
}

/// Previous and latest report for one instrument after the outer join.
/// Either side may be empty when the instrument is missing from that report.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedReport {
    pub instrument_id: String,
    pub previous_report: ReportFields,
    pub latest_report: ReportFields,
}

impl PairedReport {
    pub fn is_complete(&self) -> bool {
        !self.previous_report.is_empty() && !self.latest_report.is_empty()
    }
}
