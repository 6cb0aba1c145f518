use crate::utils::to_kebab_case;

use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// `<root>/<location>/<YYYYmmdd>/{data,reports,visualizations}` for one analysis run.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub location_slug: String,
    pub run_dir: PathBuf,
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub visualizations_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path, location: &str, run_date: NaiveDate) -> Self {
        let location_slug = to_kebab_case(location);
        let run_dir = root
            .join(&location_slug)
            .join(run_date.format("%Y%m%d").to_string());
        Self {
            location_slug,
            data_dir: run_dir.join("data"),
            reports_dir: run_dir.join("reports"),
            visualizations_dir: run_dir.join("visualizations"),
            run_dir,
        }
    }

    pub fn create(&self) -> io::Result<()> {
        for dir in [&self.data_dir, &self.reports_dir, &self.visualizations_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn cleaned_data_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}_cleaned_data.csv", self.location_slug))
    }

    pub fn report_path(&self) -> PathBuf {
        self.reports_dir
            .join(format!("{}_summary_report.txt", self.location_slug))
    }

    pub fn chart_path(&self, chart: &str) -> PathBuf {
        self.visualizations_dir
            .join(format!("{}_{}.html", self.location_slug, chart))
    }
}
