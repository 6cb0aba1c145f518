use agency_scout::analyzer::Aggregates;
use agency_scout::config::{AppConfig, load_config};
use agency_scout::model::StorageError;
use agency_scout::normalizer::load_and_clean;
use agency_scout::reporter::{ReportContext, render_summary, write_summary};
use agency_scout::storage::{CsvRow, OutputLayout, find_batches, write_rows_to_path};
use agency_scout::utils::{init_logging, title_case};
use agency_scout::visualizer::Visualizer;

use anyhow::{Context, Result, bail};
use chrono::Local;
use std::path::PathBuf;
use tracing::{error, info};

fn main() -> Result<()> {
    init_logging();

    let config = load_config("config.json").context("loading config.json")?;
    let location = title_case(&config.location);
    let today = Local::now().date_naive();

    let layout = OutputLayout::new(&config.output_root, &config.location, today);
    layout
        .create()
        .with_context(|| format!("creating {}", layout.run_dir.display()))?;

    let inputs = resolve_inputs(&config)?;
    info!("Processing data for {}...", location);
    for input in &inputs {
        info!("Using file: {}", input.display());
    }

    let dataset = load_and_clean(&inputs)?;
    let cleaned_path = layout.cleaned_data_path();
    write_rows_to_path(&cleaned_path, dataset.records.iter().map(CsvRow::from))?;
    info!("Cleaned data saved to: {}", cleaned_path.display());

    let aggs = Aggregates::compute(&dataset, today);
    let charts = Visualizer::new(&layout, &location).render_all(&aggs);

    let ctx = ReportContext {
        location: &location,
        top_n: config.top_n,
        clean: &dataset.report,
    };
    write_summary(&layout.report_path(), &render_summary(&aggs, &ctx))?;

    info!("Analysis complete! Files are organized under {}", layout.run_dir.display());
    info!("  data/            {}", cleaned_path.display());
    info!("  reports/         {}", layout.report_path().display());
    info!("  visualizations/  {} charts", charts.written.len());

    if !charts.failed.is_empty() {
        for e in &charts.failed {
            error!("{}", e);
        }
        bail!("{} chart(s) failed to render", charts.failed.len());
    }
    Ok(())
}

/// Explicit inputs from config, otherwise the newest batch (or all of them) for the location.
fn resolve_inputs(config: &AppConfig) -> Result<Vec<PathBuf>, StorageError> {
    if !config.inputs.is_empty() {
        return Ok(config.inputs.clone());
    }
    let mut batches = find_batches(&config.data_dir, &config.location)?;
    if config.concat_all_batches {
        return Ok(batches);
    }
    // find_batches never returns an empty list
    Ok(batches.split_off(batches.len() - 1))
}
