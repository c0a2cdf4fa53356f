use std::collections::BTreeMap;
use tracing::warn;

use crate::data::types::{PairedReport, ReportFields, ReportRow};

/// Full outer join of the previous and latest report on instrument identifier.
///
/// Every instrument present in either report yields exactly one
/// `PairedReport`; a side the instrument is missing from is left empty.
/// Rows without any field besides the identifier carry nothing to pair and
/// are dropped. Field values are carried over untouched. Output is sorted by
/// identifier.
pub fn merge(previous: Vec<ReportRow>, latest: Vec<ReportRow>) -> Vec<PairedReport> {
    let mut joined: BTreeMap<String, (Option<ReportFields>, Option<ReportFields>)> =
        BTreeMap::new();

    for row in previous {
        if let Some(row) = with_fields(row, "previous") {
            let (slot, _) = joined.entry(row.instrument_id.clone()).or_default();
            fill_side(slot, row, "previous");
        }
    }
    for row in latest {
        if let Some(row) = with_fields(row, "latest") {
            let (_, slot) = joined.entry(row.instrument_id.clone()).or_default();
            fill_side(slot, row, "latest");
        }
    }

    joined
        .into_iter()
        .map(|(instrument_id, (previous_report, latest_report))| PairedReport {
            instrument_id,
            previous_report: previous_report.unwrap_or_default(),
            latest_report: latest_report.unwrap_or_default(),
        })
        .collect()
}

fn with_fields(row: ReportRow, side: &str) -> Option<ReportRow> {
    if row.fields.is_empty() {
        warn!("Dropping {} row for {}: no fields", side, row.instrument_id);
        return None;
    }
    Some(row)
}

/// First row seen for an instrument wins; later duplicates are logged and dropped.
fn fill_side(slot: &mut Option<ReportFields>, row: ReportRow, side: &str) {
    if slot.is_some() {
        warn!(
            "Duplicate {} row for {}, keeping the first one",
            side, row.instrument_id
        );
        return;
    }
    *slot = Some(row.fields);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::FieldValue;

    fn index_by_instrument(records: &[PairedReport]) -> BTreeMap<&str, &PairedReport> {
        records
            .iter()
            .map(|record| (record.instrument_id.as_str(), record))
            .collect()
    }

    fn row(id: &str, fields: &[(&str, &str)]) -> ReportRow {
        ReportRow {
            instrument_id: id.to_string(),
            report_date: None,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
                .collect(),
        }
    }

    #[test]
    fn test_merge_is_full_outer_join() {
        let previous = vec![
            row("A", &[("comm_positions_long_all", "1")]),
            row("B", &[("comm_positions_long_all", "2")]),
        ];
        let latest = vec![
            row("B", &[("comm_positions_long_all", "3")]),
            row("C", &[("comm_positions_long_all", "4")]),
        ];

        let merged = merge(previous, latest);
        let ids: Vec<&str> = merged.iter().map(|r| r.instrument_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);

        let by_id = index_by_instrument(&merged);
        assert!(!by_id["A"].previous_report.is_empty());
        assert!(by_id["A"].latest_report.is_empty());

        assert!(by_id["C"].previous_report.is_empty());
        assert!(!by_id["C"].latest_report.is_empty());

        let b = by_id["B"];
        assert!(b.is_complete());
        assert_eq!(
            b.previous_report["comm_positions_long_all"],
            FieldValue::Text("2".to_string())
        );
        assert_eq!(
            b.latest_report["comm_positions_long_all"],
            FieldValue::Text("3".to_string())
        );
    }

    #[test]
    fn test_sides_only_hold_supplied_fields() {
        let previous = vec![row("A", &[("x", "1"), ("y", "2")])];
        let latest = vec![row("A", &[("x", "5")])];

        let merged = merge(previous, latest);
        assert_eq!(merged[0].previous_report.len(), 2);
        assert_eq!(merged[0].latest_report.len(), 1);
        assert!(!merged[0].latest_report.contains_key("y"));
    }

    #[test]
    fn test_merge_of_empty_reports() {
        assert!(merge(Vec::new(), Vec::new()).is_empty());

        let merged = merge(Vec::new(), vec![row("A", &[("x", "1")])]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].previous_report.is_empty());
    }

    #[test]
    fn test_field_less_rows_are_dropped() {
        let bare = ReportRow::from_json(
            serde_json::json!({ "market_and_exchange_names": "X", "foo": null })
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap();

        assert!(merge(Vec::new(), vec![bare.clone()]).is_empty());

        // Present on the other side: still one record, never both sides empty
        let merged = merge(vec![bare], vec![row("X", &[("x", "1")])]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].previous_report.is_empty());
        assert!(!merged[0].latest_report.is_empty());
    }

    #[test]
    fn test_merge_never_yields_both_sides_empty() {
        let previous = vec![row("A", &[]), row("B", &[("x", "1")])];
        let latest = vec![row("C", &[]), row("B", &[])];

        let merged = merge(previous, latest);
        assert_eq!(merged.len(), 1);
        assert!(merged
            .iter()
            .all(|r| !(r.previous_report.is_empty() && r.latest_report.is_empty())));
    }

    #[test]
    fn test_empty_duplicate_does_not_replace_first() {
        let latest = vec![row("A", &[("x", "1")]), row("A", &[])];

        let merged = merge(Vec::new(), latest);
        assert_eq!(merged[0].latest_report["x"], FieldValue::Text("1".to_string()));
    }

    #[test]
    fn test_duplicate_rows_keep_first() {
        let latest = vec![row("A", &[("x", "1")]), row("A", &[("x", "2")])];

        let merged = merge(Vec::new(), latest);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].latest_report["x"], FieldValue::Text("1".to_string()));
    }
}
