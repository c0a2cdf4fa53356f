use anyhow::Result;
use chrono::NaiveDate;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use crate::analysis::types::CategoryChange;

const CSV_HEADER: &str = "report_date,market_and_exchange_names,group,latest_long_pct,latest_short_pct,previous_long_pct,previous_short_pct,latest_net_pct,previous_net_pct,change_in_net_pct";

pub struct CsvLogger {
    log_path: String,
}

impl CsvLogger {
    pub fn new(log_path: String) -> Result<Self> {
        // Create CSV file with headers if it doesn't exist
        if !std::path::Path::new(&log_path).exists() {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .open(&log_path)?;

            writeln!(file, "{}", CSV_HEADER)?;
        }

        Ok(Self { log_path })
    }

    /// Append one row per category change for the given report date
    pub fn log_changes(&self, report_date: NaiveDate, changes: &[CategoryChange]) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)?;

        for change in changes {
            writeln!(
                file,
                "{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
                report_date,
                csv_field(&change.instrument_id),
                change.category,
                change.latest_long_pct,
                change.latest_short_pct,
                change.previous_long_pct,
                change.previous_short_pct,
                change.latest_net_pct,
                change.previous_net_pct,
                change.change_in_net_pct,
            )?;
        }

        Ok(())
    }
}

/// Instrument names contain commas now and then ("... EXCHANGE, INC.")
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write changes as JSON lines, one record per line, replacing the file.
pub fn write_json_lines(path: &str, changes: &[CategoryChange]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    for change in changes {
        serde_json::to_writer(&mut writer, change)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}
