// Companies House search-response parsing
use crate::model::{CompanyRecord, FetchError};
use serde::Deserialize;

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Total matches reported by the api, when present.
    pub hits: Option<u64>,
    pub items: Vec<CompanyRecord>,
}

pub trait Parser {
    fn parse(&self, body: &str) -> Result<SearchPage, FetchError>;
}

pub struct CompaniesHouseParser;

impl CompaniesHouseParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CompaniesHouseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    hits: Option<u64>,
    items: Option<Vec<ApiCompany>>,
}

#[derive(Debug, Deserialize)]
struct ApiCompany {
    company_name: Option<String>,
    company_number: Option<String>,
    company_status: Option<String>,
    company_type: Option<String>,
    date_of_creation: Option<String>,
    date_of_cessation: Option<String>,
    // absent and null both mean "none"
    sic_codes: Option<Vec<String>>,
    registered_office_address: Option<ApiAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiAddress {
    address_line_1: Option<String>,
    address_line_2: Option<String>,
    locality: Option<String>,
    postal_code: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

impl From<ApiCompany> for CompanyRecord {
    fn from(c: ApiCompany) -> Self {
        let address = c.registered_office_address.unwrap_or_default();
        CompanyRecord {
            company_name: c.company_name,
            company_number: c.company_number,
            status: c.company_status,
            company_type: c.company_type,
            incorporation_date: c.date_of_creation,
            dissolution_date: c.date_of_cessation,
            sic_codes: c.sic_codes.unwrap_or_default(),
            address_line_1: address.address_line_1,
            address_line_2: address.address_line_2,
            city: address.locality,
            postal_code: address.postal_code,
            region: address.region,
            country: address.country,
        }
    }
}

impl Parser for CompaniesHouseParser {
    fn parse(&self, body: &str) -> Result<SearchPage, FetchError> {
        let page: ApiPage =
            serde_json::from_str(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        Ok(SearchPage {
            hits: page.hits,
            items: page
                .items
                .unwrap_or_default()
                .into_iter()
                .map(CompanyRecord::from)
                .collect(),
        })
    }
}
