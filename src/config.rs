use crate::model::{ConfigError, FetchError, SearchQuery};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const LOCATION: &str = "Birmingham";

/// Temporary employment, placement agencies, nursing and elderly residential care.
pub const SIC_CODES: [&str; 4] = ["78200", "78109", "87100", "87300"];

pub const API_BASE_URL: &str = "https://api.company-information.service.gov.uk";
pub const API_KEY_ENV: &str = "COMPANIES_HOUSE_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub location: String,
    pub sic_codes: Vec<String>,
    /// Registry status filter sent with the search; `null` searches every status.
    pub company_status: Option<String>,
    pub base_url: String,
    pub api_key_env: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub request_timeout_seconds: Option<u64>,
    /// Keep only records whose registered address mentions the location.
    pub strict_location: bool,
    pub data_dir: PathBuf,
    pub output_root: PathBuf,
    /// Explicit analyzer inputs. Empty means "newest batch for the location".
    pub inputs: Vec<PathBuf>,
    pub concat_all_batches: bool,
    pub top_n: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            location: LOCATION.to_string(),
            sic_codes: SIC_CODES.iter().map(|s| s.to_string()).collect(),
            company_status: Some("active".to_string()),
            base_url: API_BASE_URL.to_string(),
            api_key_env: API_KEY_ENV.to_string(),
            page_size: 100,
            max_pages: 50,
            request_timeout_seconds: None,
            strict_location: false,
            data_dir: PathBuf::from("data"),
            output_root: PathBuf::from("healthcare_analysis"),
            inputs: Vec::new(),
            concat_all_batches: false,
            top_n: 5,
        }
    }
}

impl AppConfig {
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            location: self.location.clone(),
            sic_codes: self.sic_codes.clone(),
            company_status: self.company_status.clone(),
            page_size: self.page_size.max(1),
        }
    }

    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, FetchError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(FetchError::MissingApiKey(self.api_key_env.clone())),
        }
    }
}

/// Loads `path` if it exists, otherwise falls back to the built-in defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No {} found, using built-in defaults", path.display());
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}
