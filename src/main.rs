mod analysis;
mod config;
mod data;
mod monitoring;

use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;

use analysis::change::MalformedPolicy;
use config::{Config, EnvConfig};
use data::fetcher::{fetch_report_pair, report_dates};
use data::merge::merge;
use data::socrata::SocrataClient;
use monitoring::dashboard::{all_changes, render, Dashboard};
use monitoring::logger::{write_json_lines, CsvLogger};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("📊 COT watch starting...");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    tracing::info!("Loading configuration from {}", config_path);
    let config = Config::load(&config_path)?;
    let env_config = EnvConfig::load()?;

    let domain = env_config
        .source_domain
        .clone()
        .unwrap_or_else(|| config.source.domain.clone());
    tracing::info!("Source: {} dataset {}", domain, config.source.dataset_id);
    tracing::info!("Match mode: {:?}", config.analysis.match_mode);
    tracing::info!("Sections: {}", config.sections.len());
    if config.sections.is_empty() {
        tracing::warn!("No sections configured, nothing will be displayed");
    }

    let client = SocrataClient::new(
        domain,
        config.source.dataset_id.clone(),
        env_config.app_token.clone(),
        Duration::from_secs(config.source.timeout_secs),
        config.source.row_limit,
    )
    .context("Failed to build dataset client")?;

    // Pull the previous and latest report
    let now = Utc::now();
    let dates = report_dates(now);
    let (latest, previous) = fetch_report_pair(&client, now)
        .await
        .context("Failed to fetch COT reports")?;

    let records = merge(previous, latest);
    tracing::info!("Merged reports cover {} instruments", records.len());

    let policy = if config.analysis.skip_malformed {
        MalformedPolicy::Skip
    } else {
        MalformedPolicy::Fail
    };
    let dashboard = Dashboard::new(&config.sections, config.analysis.match_mode, policy);
    let views = dashboard.build(&records)?;

    println!("COT report {} vs {}\n", dates.latest, dates.previous);
    print!("{}", render(&views));

    let changes = all_changes(&views);
    if config.monitoring.csv_logging {
        let logger = CsvLogger::new(config.monitoring.csv_log_path.clone())?;
        logger.log_changes(dates.latest, &changes)?;
        tracing::info!("Logged {} changes to {}", changes.len(), config.monitoring.csv_log_path);
    }
    if let Some(path) = &config.monitoring.json_output_path {
        write_json_lines(path, &changes)
            .with_context(|| format!("Failed to write {}", path))?;
        tracing::info!("Wrote {} changes to {}", changes.len(), path);
    }

    tracing::info!("✅ Done");
    Ok(())
}
