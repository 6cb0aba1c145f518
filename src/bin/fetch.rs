use agency_scout::config::load_config;
use agency_scout::fetcher::{CompaniesHouseClient, PageLimits, fetch_batch};
use agency_scout::model::FetchBatch;
use agency_scout::parser::CompaniesHouseParser;
use agency_scout::storage::write_batch;
use agency_scout::utils::init_logging;

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    init_logging();

    let config = load_config("config.json").context("loading config.json")?;
    let api_key = config.api_key()?;
    info!("Searching in location: {}", config.location);

    let client = CompaniesHouseClient::new(
        &config.base_url,
        api_key,
        config.request_timeout_seconds.map(Duration::from_secs),
    )?;
    client.check_auth()?;

    let parser = CompaniesHouseParser::new();
    let query = config.search_query();
    let limits = PageLimits {
        max_pages: config.max_pages,
        strict_location: config.strict_location,
    };

    match fetch_batch(&client, &parser, &query, &limits) {
        Ok(batch) => {
            if batch.records.is_empty() {
                warn!("No companies found for {}", config.location);
            }
            let path = write_batch(&batch, &config.data_dir)?;
            log_summary(&batch);
            info!("Data saved to: {}", path.display());
            Ok(())
        }
        Err(partial) => {
            error!("{}", partial);
            if !partial.batch.records.is_empty() {
                match write_batch(&partial.batch, &config.data_dir) {
                    Ok(path) => warn!("Partial data saved to: {}", path.display()),
                    Err(e) => error!("Failed to save partial data: {}", e),
                }
            }
            Err(partial.into())
        }
    }
}

fn log_summary(batch: &FetchBatch) {
    info!("Total companies found: {}", batch.records.len());
    for record in batch.records.iter().take(5) {
        info!(
            "  {} | {} | {}",
            record.company_name.as_deref().unwrap_or("?"),
            record.city.as_deref().unwrap_or("-"),
            record.postal_code.as_deref().unwrap_or("-")
        );
    }
}
