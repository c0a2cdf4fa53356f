use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::data::types::ReportRow;

/// Something that can return the rows of one tabular dataset whose `field`
/// equals `value`. The report fetcher only depends on this capability.
#[async_trait]
pub trait DatasetQuery: Send + Sync {
    async fn query_equal(&self, field: &str, value: &str) -> Result<Vec<ReportRow>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Upstream returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else {
            FetchError::Transport(err)
        }
    }
}

/// Client for a Socrata open-data endpoint (SODA 2.x resource API).
pub struct SocrataClient {
    client: Client,
    domain: String,
    dataset_id: String,
    app_token: Option<String>,
    row_limit: usize,
}

impl SocrataClient {
    pub fn new(
        domain: String,
        dataset_id: String,
        app_token: Option<String>,
        timeout: Duration,
        row_limit: usize,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Transport)?;

        if app_token.is_none() {
            warn!("No app token configured for {}, requests will be throttled", domain);
        }

        Ok(Self {
            client,
            domain,
            dataset_id,
            app_token,
            row_limit,
        })
    }

    fn resource_url(&self) -> String {
        format!("https://{}/resource/{}.json", self.domain, self.dataset_id)
    }
}

#[async_trait]
impl DatasetQuery for SocrataClient {
    async fn query_equal(&self, field: &str, value: &str) -> Result<Vec<ReportRow>, FetchError> {
        let url = self.resource_url();
        let where_clause = equality_clause(field, value);
        let limit = self.row_limit.to_string();

        debug!("GET {} $where={}", url, where_clause);

        let mut request = self
            .client
            .get(&url)
            .query(&[("$where", where_clause.as_str()), ("$limit", limit.as_str())]);
        if let Some(token) = &self.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let rows = rows_from_payload(payload)?;
        if is_truncated(rows.len(), self.row_limit) {
            warn!(
                "{} = '{}' returned {} rows, the configured limit; the report may be truncated",
                field, value, rows.len()
            );
        }

        Ok(rows)
    }
}

/// A response that fills `$limit` may have been cut short.
fn is_truncated(row_count: usize, row_limit: usize) -> bool {
    row_count >= row_limit
}

/// SoQL equality predicate; single quotes inside the literal are doubled.
fn equality_clause(field: &str, value: &str) -> String {
    format!("{} = '{}'", field, value.replace('\'', "''"))
}

fn rows_from_payload(payload: Value) -> Result<Vec<ReportRow>, FetchError> {
    let Value::Array(items) = payload else {
        return Err(FetchError::Decode("expected a JSON array of rows".to_string()));
    };

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(object) = item else {
            return Err(FetchError::Decode("expected each row to be a JSON object".to_string()));
        };
        match ReportRow::from_json(object) {
            Some(row) => rows.push(row),
            None => warn!("Dropping row without instrument identifier"),
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equality_clause() {
        assert_eq!(
            equality_clause("report_date_as_yyyy_mm_dd", "2024-05-28"),
            "report_date_as_yyyy_mm_dd = '2024-05-28'"
        );
        assert_eq!(equality_clause("name", "O'HARE"), "name = 'O''HARE'");
    }

    #[test]
    fn test_resource_url() {
        let client = SocrataClient::new(
            "publicreporting.cftc.gov".to_string(),
            "6dca-aqww".to_string(),
            None,
            Duration::from_secs(5),
            100,
        )
        .unwrap();

        assert_eq!(
            client.resource_url(),
            "https://publicreporting.cftc.gov/resource/6dca-aqww.json"
        );
    }

    #[test]
    fn test_full_page_is_flagged_truncated() {
        assert!(is_truncated(5000, 5000));
        assert!(!is_truncated(4999, 5000));
        assert!(!is_truncated(0, 5000));
    }

    #[tokio::test]
    async fn test_request_timeout_maps_to_timeout_error() {
        // Connections complete in the kernel backlog but nothing ever answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let err = client
            .get(format!("http://{}/resource/6dca-aqww.json", addr))
            .send()
            .await
            .unwrap_err();

        let err = FetchError::from(err);
        assert!(matches!(err, FetchError::Timeout(_)), "got {:?}", err);

        drop(listener);
    }

    #[test]
    fn test_rows_from_payload() {
        let rows = rows_from_payload(json!([
            { "market_and_exchange_names": "GOLD - COMMODITY EXCHANGE INC.", "comm_positions_long_all": "10" },
            { "comm_positions_long_all": "5" },
        ]))
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].instrument_id, "GOLD - COMMODITY EXCHANGE INC.");
    }

    #[test]
    fn test_empty_payload_is_not_an_error() {
        assert!(rows_from_payload(json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_non_array_payload_is_decode_error() {
        let err = rows_from_payload(json!({ "error": true, "message": "bad query" })).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));

        let err = rows_from_payload(json!([1, 2])).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
