use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use tracing::{info, warn};

use crate::data::socrata::{DatasetQuery, FetchError};
use crate::data::types::{ReportRow, REPORT_DATE_FIELD};

/// Fixed offset from UTC to approximate US Eastern time. No DST handling.
const EASTERN_OFFSET_HOURS: i64 = 4;
/// Reports for the week go out on Friday at 15:30 Eastern.
const RELEASE_TIME: (u32, u32) = (15, 30);

/// Data dates (Tuesdays) of the two most recent published reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDates {
    pub latest: NaiveDate,
    pub previous: NaiveDate,
}

/// Work out which two weekly reports are available at `now`.
pub fn report_dates(now: DateTime<Utc>) -> ReportDates {
    let eastern = now.naive_utc() - Duration::hours(EASTERN_OFFSET_HOURS);
    let today = eastern.date();

    // Days since the last Friday (Friday itself -> 0)
    let since_friday = (today.weekday().num_days_from_monday() as i64 - 4).rem_euclid(7);
    let mut last_friday = today - Duration::days(since_friday);

    if since_friday == 0 && (eastern.hour(), eastern.minute()) < RELEASE_TIME {
        last_friday -= Duration::weeks(1);
    }

    let latest = last_friday - Duration::days(3);
    ReportDates {
        latest,
        previous: latest - Duration::weeks(1),
    }
}

/// Rows of the latest and previous report, in that order.
pub async fn fetch_report_pair<Q: DatasetQuery + ?Sized>(
    source: &Q,
    now: DateTime<Utc>,
) -> Result<(Vec<ReportRow>, Vec<ReportRow>), FetchError> {
    let dates = report_dates(now);
    info!("Report dates: latest={} previous={}", dates.latest, dates.previous);

    let latest = fetch_report(source, dates.latest).await?;
    let previous = fetch_report(source, dates.previous).await?;

    Ok((latest, previous))
}

async fn fetch_report<Q: DatasetQuery + ?Sized>(
    source: &Q,
    date: NaiveDate,
) -> Result<Vec<ReportRow>, FetchError> {
    let value = date.format("%Y-%m-%d").to_string();
    let rows = source.query_equal(REPORT_DATE_FIELD, &value).await?;

    info!("Fetched {} rows for report {}", rows.len(), value);

    let off_date = rows
        .iter()
        .filter(|row| matches!(&row.report_date, Some(d) if !d.starts_with(&value)))
        .count();
    if off_date > 0 {
        warn!("{} rows for report {} carry a different report date", off_date, value);
    }

    Ok(rows)
}
