pub mod charts;

use crate::analyzer::Aggregates;
use crate::model::ChartError;
use crate::storage::OutputLayout;

use plotly::Plot;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

type ChartBuilder = fn(&Aggregates, &str) -> Option<Plot>;

/// Chart file stem and the builder that draws it.
pub const CHARTS: [(&str, ChartBuilder); 9] = [
    ("companies_by_year", charts::companies_by_year),
    ("postal_distribution", charts::postal_distribution),
    ("company_types", charts::company_types),
    ("sic_codes", charts::sic_codes),
    ("status_breakdown", charts::status_breakdown),
    ("status_by_year", charts::status_by_year),
    ("healthcare_services", charts::healthcare_services),
    ("age_distribution", charts::age_distribution),
    ("geographic_distribution", charts::geographic_distribution),
];

#[derive(Debug, Default)]
pub struct RenderSummary {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<&'static str>,
    pub failed: Vec<ChartError>,
}

pub struct Visualizer<'a> {
    layout: &'a OutputLayout,
    location_title: String,
}

impl<'a> Visualizer<'a> {
    pub fn new(layout: &'a OutputLayout, location_title: &str) -> Self {
        Self {
            layout,
            location_title: location_title.to_string(),
        }
    }

    /// Draws every chart. A failed chart does not stop the others.
    pub fn render_all(&self, aggs: &Aggregates) -> RenderSummary {
        let mut summary = RenderSummary::default();
        for (name, build) in CHARTS {
            let Some(plot) = build(aggs, &self.location_title) else {
                info!("Chart {} skipped: no data", name);
                summary.skipped.push(name);
                continue;
            };
            match self.write(name, &plot) {
                Ok(path) => summary.written.push(path),
                Err(e) => {
                    warn!("{}", e);
                    summary.failed.push(e);
                }
            }
        }
        info!(
            "Visualizations saved in: {} ({} written, {} skipped, {} failed)",
            self.layout.visualizations_dir.display(),
            summary.written.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        summary
    }

    fn write(&self, name: &str, plot: &Plot) -> Result<PathBuf, ChartError> {
        let path = self.layout.chart_path(name);
        fs::write(&path, plot.to_html()).map_err(|source| ChartError::Write {
            path: path.display().to_string(),
            source,
        })?;
        info!("Saved chart {}", path.display());
        Ok(path)
    }
}
