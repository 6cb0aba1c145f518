use crate::model::{CleanRecord, CompanyRecord, FetchBatch, StorageError};
use crate::utils::to_kebab_case;

use chrono::{DateTime, Local};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const FILE_PREFIX: &str = "healthcare_agencies";

pub const COLUMNS: [&str; 13] = [
    "Company Name",
    "Company Number",
    "Status",
    "Company Type",
    "Incorporation Date",
    "Dissolution Date",
    "SIC Codes",
    "Address Line 1",
    "Address Line 2",
    "City",
    "Postal Code",
    "Region",
    "Country",
];

pub const REQUIRED_COLUMNS: [&str; 2] = ["Company Name", "Company Number"];

/// On-disk row layout. Field order matches `COLUMNS`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Company Name")]
    pub company_name: Option<String>,
    #[serde(rename = "Company Number")]
    pub company_number: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Company Type")]
    pub company_type: Option<String>,
    #[serde(rename = "Incorporation Date")]
    pub incorporation_date: Option<String>,
    #[serde(rename = "Dissolution Date")]
    pub dissolution_date: Option<String>,
    #[serde(rename = "SIC Codes")]
    pub sic_codes: Option<String>,
    #[serde(rename = "Address Line 1")]
    pub address_line_1: Option<String>,
    #[serde(rename = "Address Line 2")]
    pub address_line_2: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Postal Code")]
    pub postal_code: Option<String>,
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
}

fn join_codes(codes: &[String]) -> Option<String> {
    if codes.is_empty() {
        None
    } else {
        Some(codes.join(", "))
    }
}

impl From<&CompanyRecord> for CsvRow {
    fn from(r: &CompanyRecord) -> Self {
        CsvRow {
            company_name: r.company_name.clone(),
            company_number: r.company_number.clone(),
            status: r.status.clone(),
            company_type: r.company_type.clone(),
            incorporation_date: r.incorporation_date.clone(),
            dissolution_date: r.dissolution_date.clone(),
            sic_codes: join_codes(&r.sic_codes),
            address_line_1: r.address_line_1.clone(),
            address_line_2: r.address_line_2.clone(),
            city: r.city.clone(),
            postal_code: r.postal_code.clone(),
            region: r.region.clone(),
            country: r.country.clone(),
        }
    }
}

impl From<&CleanRecord> for CsvRow {
    fn from(r: &CleanRecord) -> Self {
        CsvRow {
            company_name: Some(r.company_name.clone()),
            company_number: Some(r.company_number.clone()),
            status: r.status.as_ref().map(|s| s.code().to_string()),
            company_type: r.company_type.as_ref().map(|t| t.code().to_string()),
            incorporation_date: r.incorporation_date.map(|d| d.format("%Y-%m-%d").to_string()),
            dissolution_date: r.dissolution_date.map(|d| d.format("%Y-%m-%d").to_string()),
            sic_codes: join_codes(&r.sic_codes),
            address_line_1: r.address_line_1.clone(),
            address_line_2: r.address_line_2.clone(),
            city: r.city.clone(),
            postal_code: r.postal_code.clone(),
            region: r.region.clone(),
            country: r.country.clone(),
        }
    }
}

impl From<CsvRow> for CompanyRecord {
    fn from(row: CsvRow) -> Self {
        let sic_codes = row
            .sic_codes
            .as_deref()
            .map(|codes| {
                codes
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        CompanyRecord {
            company_name: row.company_name,
            company_number: row.company_number,
            status: row.status,
            company_type: row.company_type,
            incorporation_date: row.incorporation_date,
            dissolution_date: row.dissolution_date,
            sic_codes,
            address_line_1: row.address_line_1,
            address_line_2: row.address_line_2,
            city: row.city,
            postal_code: row.postal_code,
            region: row.region,
            country: row.country,
        }
    }
}

/// Rows read from one CSV source.
#[derive(Debug, Default)]
pub struct CsvLoad {
    pub records: Vec<CompanyRecord>,
    /// Rows that could not be decoded at all and were skipped.
    pub malformed_rows: usize,
}

/// File name for a fetch batch: `healthcare_agencies_<location>_<YYYYmmdd_HHMMSS>.csv`.
pub fn batch_file_name(location: &str, fetched_at: &DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.csv",
        FILE_PREFIX,
        to_kebab_case(location),
        fetched_at.format("%Y%m%d_%H%M%S")
    )
}

/// Writes rows with a header line, even when there are no rows.
pub fn write_rows<W, I>(writer: W, rows: I) -> Result<(), StorageError>
where
    W: Write,
    I: IntoIterator<Item = CsvRow>,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_rows_to_path<I>(path: &Path, rows: I) -> Result<(), StorageError>
where
    I: IntoIterator<Item = CsvRow>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_rows(File::create(path)?, rows)
}

/// Persists a fetch batch under `data_dir` and returns the written path.
pub fn write_batch(batch: &FetchBatch, data_dir: &Path) -> Result<PathBuf, StorageError> {
    let path = data_dir.join(batch_file_name(&batch.location, &batch.fetched_at));
    write_rows_to_path(&path, batch.records.iter().map(CsvRow::from))?;
    info!("Saved {} records to {}", batch.records.len(), path.display());
    Ok(path)
}

/// Reads CSV rows. `source` only labels errors and log lines.
pub fn read_rows<R: Read>(reader: R, source: &str) -> Result<CsvLoad, StorageError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(StorageError::MissingColumn {
                path: source.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut load = CsvLoad::default();
    for (i, result) in rdr.deserialize::<CsvRow>().enumerate() {
        match result {
            Ok(row) => load.records.push(CompanyRecord::from(row)),
            Err(e) => {
                // +2: header line and 1-based numbering
                warn!("{}: skipping malformed row {}: {}", source, i + 2, e);
                load.malformed_rows += 1;
            }
        }
    }
    Ok(load)
}

pub fn read_rows_from_path(path: &Path) -> Result<CsvLoad, StorageError> {
    let file = File::open(path)?;
    let load = read_rows(file, &path.display().to_string())?;
    info!("Loaded {} rows from {}", load.records.len(), path.display());
    Ok(load)
}

/// Batch files for `location` in `data_dir`, oldest first.
pub fn find_batches(data_dir: &Path, location: &str) -> Result<Vec<PathBuf>, StorageError> {
    let prefix = format!("{}_{}_", FILE_PREFIX, to_kebab_case(location));
    let mut found: Vec<PathBuf> = fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix) && n.ends_with(".csv"))
                .unwrap_or(false)
        })
        .collect();

    if found.is_empty() {
        return Err(StorageError::NoInput(format!(
            "no {}*.csv files in {}",
            prefix,
            data_dir.display()
        )));
    }
    // timestamps in the names sort chronologically
    found.sort();
    Ok(found)
}
