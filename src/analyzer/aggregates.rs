use crate::analyzer::age::{AgeBucket, age_in_fractional_years, age_in_years};
use crate::analyzer::trends::{Trend, TrendAnalyzer};
use crate::model::{AnalysisDataset, CompanyStatus, CompanyType};
use crate::normalizer::uk_inward_split;

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

pub type Counts = BTreeMap<String, usize>;

/// First year drawn on the formations chart and fitted by the trend line.
pub const TREND_START_YEAR: i32 = 2000;

/// SIC codes of health and social care services and their descriptions.
pub const HEALTHCARE_SERVICES: [(&str, &str); 13] = [
    ("86101", "General Medical Practice"),
    ("86102", "Specialist Medical Practice"),
    ("86210", "General Dental Practice"),
    ("86220", "Specialist Dental Practice"),
    ("86230", "Dental Practice Activities"),
    ("86900", "Other Healthcare Activities"),
    ("87100", "Residential Nursing Care"),
    ("87200", "Residential Care (Learning Disabilities)"),
    ("87300", "Residential Care (Elderly)"),
    ("87900", "Other Residential Care"),
    ("88100", "Social Work (Elderly)"),
    ("88910", "Child Day-care"),
    ("88990", "Other Social Work"),
];

pub fn healthcare_service(sic: &str) -> Option<&'static str> {
    HEALTHCARE_SERVICES
        .iter()
        .find(|(code, _)| *code == sic)
        .map(|(_, name)| *name)
}

/// Every grouped count and summary statistic the charts and the report draw on.
#[derive(Debug, Clone)]
pub struct Aggregates {
    pub today: NaiveDate,
    pub total: usize,
    pub by_year: BTreeMap<i32, usize>,
    pub by_postal_prefix: Counts,
    pub by_type: BTreeMap<CompanyType, usize>,
    pub by_sic: Counts,
    pub by_status: BTreeMap<CompanyStatus, usize>,
    pub by_age_bucket: BTreeMap<AgeBucket, usize>,
    pub by_city: Counts,
    pub status_by_year: BTreeMap<i32, BTreeMap<CompanyStatus, usize>>,
    pub healthcare_services: Counts,
    pub average_age_years: Option<f64>,
    pub year_range: Option<(i32, i32)>,
    /// Incorporated in the current calendar year or the two before it.
    pub recent_incorporations: usize,
    pub growth_rate: f64,
    pub year_trend: Option<Trend>,
}

impl Aggregates {
    /// Computes every aggregate in one pass over the dataset. `today` anchors ages.
    pub fn compute(dataset: &AnalysisDataset, today: NaiveDate) -> Self {
        let mut by_year = BTreeMap::new();
        let mut by_postal_prefix = Counts::new();
        let mut by_type = BTreeMap::new();
        let mut by_sic = Counts::new();
        let mut by_status = BTreeMap::new();
        let mut by_age_bucket: BTreeMap<AgeBucket, usize> =
            AgeBucket::ALL.iter().map(|b| (*b, 0)).collect();
        let mut by_city = Counts::new();
        let mut status_by_year: BTreeMap<i32, BTreeMap<CompanyStatus, usize>> = BTreeMap::new();
        let mut healthcare_services = Counts::new();
        let mut ages = Vec::new();

        for record in &dataset.records {
            if let Some(date) = record.incorporation_date {
                *by_year.entry(date.year()).or_insert(0) += 1;
                if let Some(status) = &record.status {
                    *status_by_year
                        .entry(date.year())
                        .or_default()
                        .entry(status.clone())
                        .or_insert(0) += 1;
                }
                if let Some(years) = age_in_years(date, today) {
                    *by_age_bucket.entry(AgeBucket::for_age(years)).or_insert(0) += 1;
                }
                if let Some(age) = age_in_fractional_years(date, today) {
                    ages.push(age);
                }
            }
            if let Some(prefix) = record.postal_code.as_deref().and_then(postal_prefix) {
                *by_postal_prefix.entry(prefix).or_insert(0) += 1;
            }
            if let Some(company_type) = &record.company_type {
                *by_type.entry(company_type.clone()).or_insert(0) += 1;
            }
            if let Some(status) = &record.status {
                *by_status.entry(status.clone()).or_insert(0) += 1;
            }
            if let Some(city) = &record.city {
                *by_city.entry(city.clone()).or_insert(0) += 1;
            }
            for sic in &record.sic_codes {
                *by_sic.entry(sic.clone()).or_insert(0) += 1;
                if let Some(service) = healthcare_service(sic) {
                    *healthcare_services.entry(service.to_string()).or_insert(0) += 1;
                }
            }
        }

        let average_age_years = if ages.is_empty() {
            None
        } else {
            Some(ages.iter().sum::<f64>() / ages.len() as f64)
        };
        let year_range = match (by_year.keys().next(), by_year.keys().next_back()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        };
        let recent_from = today.year() - 2;
        let recent_incorporations = by_year
            .range(recent_from..)
            .map(|(_, count)| count)
            .sum();
        let points: Vec<(f64, f64)> = by_year
            .range(TREND_START_YEAR..)
            .map(|(year, count)| (f64::from(*year), *count as f64))
            .collect();

        Aggregates {
            today,
            total: dataset.records.len(),
            growth_rate: TrendAnalyzer::growth_rate(&by_year),
            year_trend: TrendAnalyzer::linear_trend(&points),
            by_year,
            by_postal_prefix,
            by_type,
            by_sic,
            by_status,
            by_age_bucket,
            by_city,
            status_by_year,
            healthcare_services,
            average_age_years,
            year_range,
            recent_incorporations,
        }
    }

    /// Status shares in percent, largest first.
    pub fn status_percentages(&self) -> Vec<(CompanyStatus, f64)> {
        let counted: usize = self.by_status.values().sum();
        if counted == 0 {
            return Vec::new();
        }
        ranked(&self.by_status)
            .into_iter()
            .map(|(status, count)| (status, count as f64 * 100.0 / counted as f64))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.by_status
            .get(&CompanyStatus::Active)
            .copied()
            .unwrap_or(0)
    }
}

/// Outward part of a postcode: `SW1A 1AA` -> `SW1A`, `E1 6AN` -> `E1`.
pub fn postal_prefix(code: &str) -> Option<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return None;
    }
    if let Some((outward, _)) = code.split_once(char::is_whitespace) {
        return Some(outward.to_string());
    }
    match uk_inward_split(&code) {
        Some(split) => Some(code[..split].to_string()),
        None => Some(code),
    }
}

/// Text a grouping key is shown as; ties in a ranking sort by it.
pub trait RankLabel {
    fn rank_label(&self) -> String;
}

impl RankLabel for String {
    fn rank_label(&self) -> String {
        self.clone()
    }
}

impl RankLabel for CompanyStatus {
    fn rank_label(&self) -> String {
        self.label()
    }
}

impl RankLabel for CompanyType {
    fn rank_label(&self) -> String {
        self.label()
    }
}

/// Entries by count descending, ties broken by label ascending.
pub fn ranked<K: Clone + Ord + RankLabel>(counts: &BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut entries: Vec<(String, K, usize)> = counts
        .iter()
        .map(|(k, v)| (k.rank_label(), k.clone(), *v))
        .collect();
    entries.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    entries.into_iter().map(|(_, k, v)| (k, v)).collect()
}

pub fn top_n<K: Clone + Ord + RankLabel>(counts: &BTreeMap<K, usize>, n: usize) -> Vec<(K, usize)> {
    let mut entries = ranked(counts);
    entries.truncate(n);
    entries
}
