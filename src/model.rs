// Core structs: CompanyRecord, CleanRecord, FetchBatch, and the per-stage errors
use chrono::{DateTime, Local, NaiveDate};
use std::fmt;
use thiserror::Error;

/// One company as returned by the registry search, values kept verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyRecord {
    pub company_name: Option<String>,
    pub company_number: Option<String>,
    pub status: Option<String>,
    pub company_type: Option<String>,
    pub incorporation_date: Option<String>,
    pub dissolution_date: Option<String>,
    pub sic_codes: Vec<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl CompanyRecord {
    /// Concatenated address fields, used for location matching.
    pub fn address_text(&self) -> String {
        [
            &self.address_line_1,
            &self.address_line_2,
            &self.city,
            &self.postal_code,
            &self.region,
            &self.country,
        ]
        .iter()
        .filter_map(|f| f.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// A row after cleaning: mandatory fields present, dates and vocabularies typed.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub company_name: String,
    pub company_number: String,
    pub status: Option<CompanyStatus>,
    pub company_type: Option<CompanyType>,
    pub incorporation_date: Option<NaiveDate>,
    pub dissolution_date: Option<NaiveDate>,
    pub sic_codes: Vec<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// What the cleaner dropped or flagged on the way in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_read: usize,
    pub malformed_rows: usize,
    pub missing_number: usize,
    pub missing_name: usize,
    pub duplicates: usize,
    pub unparsed_dates: usize,
}

impl CleanReport {
    pub fn dropped(&self) -> usize {
        self.missing_number + self.missing_name + self.duplicates
    }
}

/// Cleaned rows of one or more batches, rebuilt on every analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisDataset {
    pub records: Vec<CleanRecord>,
    pub report: CleanReport,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompanyStatus {
    Active,
    Dissolved,
    Liquidation,
    Receivership,
    Administration,
    VoluntaryArrangement,
    ConvertedClosed,
    InsolvencyProceedings,
    Open,
    Closed,
    Registered,
    Removed,
    /// Anything outside the registry vocabulary, kept as read.
    Other(String),
}

impl CompanyStatus {
    pub const KNOWN: [CompanyStatus; 12] = [
        CompanyStatus::Active,
        CompanyStatus::Dissolved,
        CompanyStatus::Liquidation,
        CompanyStatus::Receivership,
        CompanyStatus::Administration,
        CompanyStatus::VoluntaryArrangement,
        CompanyStatus::ConvertedClosed,
        CompanyStatus::InsolvencyProceedings,
        CompanyStatus::Open,
        CompanyStatus::Closed,
        CompanyStatus::Registered,
        CompanyStatus::Removed,
    ];

    /// Registry code, as written to CSV.
    pub fn code(&self) -> &str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Dissolved => "dissolved",
            CompanyStatus::Liquidation => "liquidation",
            CompanyStatus::Receivership => "receivership",
            CompanyStatus::Administration => "administration",
            CompanyStatus::VoluntaryArrangement => "voluntary-arrangement",
            CompanyStatus::ConvertedClosed => "converted-closed",
            CompanyStatus::InsolvencyProceedings => "insolvency-proceedings",
            CompanyStatus::Open => "open",
            CompanyStatus::Closed => "closed",
            CompanyStatus::Registered => "registered",
            CompanyStatus::Removed => "removed",
            CompanyStatus::Other(raw) => raw,
        }
    }

    /// Human label used in charts and the report, e.g. "Voluntary Arrangement".
    pub fn label(&self) -> String {
        match self {
            CompanyStatus::Other(raw) => raw.clone(),
            known => crate::utils::title_case(&known.code().replace('-', " ")),
        }
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompanyType {
    Ltd,
    Plc,
    Llp,
    PrivateUnlimited,
    PrivateUnlimitedNsc,
    PrivateLimitedGuarantNsc,
    PrivateLimitedGuarantNscLimitedExemption,
    PrivateLimitedSharesSection30Exemption,
    LimitedPartnership,
    CharitableIncorporatedOrganisation,
    RegisteredSocietyNonJurisdictional,
    OverseaCompany,
    Other(String),
}

impl CompanyType {
    pub const KNOWN: [CompanyType; 12] = [
        CompanyType::Ltd,
        CompanyType::Plc,
        CompanyType::Llp,
        CompanyType::PrivateUnlimited,
        CompanyType::PrivateUnlimitedNsc,
        CompanyType::PrivateLimitedGuarantNsc,
        CompanyType::PrivateLimitedGuarantNscLimitedExemption,
        CompanyType::PrivateLimitedSharesSection30Exemption,
        CompanyType::LimitedPartnership,
        CompanyType::CharitableIncorporatedOrganisation,
        CompanyType::RegisteredSocietyNonJurisdictional,
        CompanyType::OverseaCompany,
    ];

    pub fn code(&self) -> &str {
        match self {
            CompanyType::Ltd => "ltd",
            CompanyType::Plc => "plc",
            CompanyType::Llp => "llp",
            CompanyType::PrivateUnlimited => "private-unlimited",
            CompanyType::PrivateUnlimitedNsc => "private-unlimited-nsc",
            CompanyType::PrivateLimitedGuarantNsc => "private-limited-guarant-nsc",
            CompanyType::PrivateLimitedGuarantNscLimitedExemption => {
                "private-limited-guarant-nsc-limited-exemption"
            }
            CompanyType::PrivateLimitedSharesSection30Exemption => {
                "private-limited-shares-section-30-exemption"
            }
            CompanyType::LimitedPartnership => "limited-partnership",
            CompanyType::CharitableIncorporatedOrganisation => {
                "charitable-incorporated-organisation"
            }
            CompanyType::RegisteredSocietyNonJurisdictional => {
                "registered-society-non-jurisdictional"
            }
            CompanyType::OverseaCompany => "oversea-company",
            CompanyType::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> String {
        match self {
            CompanyType::Ltd => "Private limited company".into(),
            CompanyType::Plc => "Public limited company".into(),
            CompanyType::Llp => "Limited liability partnership".into(),
            CompanyType::PrivateUnlimited => "Private unlimited company".into(),
            CompanyType::PrivateUnlimitedNsc => "Private unlimited company without share capital".into(),
            CompanyType::PrivateLimitedGuarantNsc => "Private limited by guarantee without share capital".into(),
            CompanyType::PrivateLimitedGuarantNscLimitedExemption => {
                "Private limited by guarantee, use of 'Limited' exemption".into()
            }
            CompanyType::PrivateLimitedSharesSection30Exemption => {
                "Private limited by shares, section 30 exemption".into()
            }
            CompanyType::LimitedPartnership => "Limited partnership".into(),
            CompanyType::CharitableIncorporatedOrganisation => "Charitable incorporated organisation".into(),
            CompanyType::RegisteredSocietyNonJurisdictional => "Registered society".into(),
            CompanyType::OverseaCompany => "Overseas company".into(),
            CompanyType::Other(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parameters of one registry search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub location: String,
    pub sic_codes: Vec<String>,
    pub company_status: Option<String>,
    pub page_size: u32,
}

/// Records collected by one fetch run, in arrival order.
#[derive(Debug, Clone)]
pub struct FetchBatch {
    pub location: String,
    pub sic_codes: Vec<String>,
    pub fetched_at: DateTime<Local>,
    pub pages: usize,
    pub records: Vec<CompanyRecord>,
}

impl FetchBatch {
    pub fn new(query: &SearchQuery) -> Self {
        Self {
            location: query.location.clone(),
            sic_codes: query.sic_codes.clone(),
            fetched_at: Local::now(),
            pages: 0,
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("authentication rejected by api ({0})")]
    Unauthorized(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("api key missing, set {0}")]
    MissingApiKey(String),
}

/// A fetch that stopped early. Carries whatever was collected before the failure.
#[derive(Debug, Error)]
#[error("fetch aborted after {} records on page {}: {}", .batch.records.len(), .batch.pages + 1, .source)]
pub struct PartialFetch {
    pub batch: FetchBatch,
    #[source]
    pub source: FetchError,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: String, column: String },
    #[error("no input files: {0}")]
    NoInput(String),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to write chart {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
