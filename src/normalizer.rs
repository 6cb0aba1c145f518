use crate::model::{
    AnalysisDataset, CleanRecord, CleanReport, CompanyRecord, CompanyStatus, CompanyType, StorageError,
};
use crate::storage::read_rows_from_path;
use crate::utils::{collapse_whitespace, parse_date, title_case};

use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Reads every input file, concatenates the rows and cleans them.
pub fn load_and_clean(paths: &[PathBuf]) -> Result<AnalysisDataset, StorageError> {
    if paths.is_empty() {
        return Err(StorageError::NoInput("no input files given".into()));
    }
    let mut records = Vec::new();
    let mut malformed = 0;
    for path in paths {
        let load = read_rows_from_path(path)?;
        malformed += load.malformed_rows;
        records.extend(load.records);
    }
    let mut dataset = clean_all(records);
    dataset.report.malformed_rows = malformed;
    dataset.report.rows_read += malformed;
    Ok(dataset)
}

/// Cleans raw rows in order. Rows without a company number or name are dropped,
/// as are repeats of a company number already seen.
pub fn clean_all(records: Vec<CompanyRecord>) -> AnalysisDataset {
    let mut report = CleanReport {
        rows_read: records.len(),
        ..CleanReport::default()
    };
    let mut seen: HashSet<String> = HashSet::new();
    let mut cleaned = Vec::with_capacity(records.len());

    for (i, record) in records.into_iter().enumerate() {
        let Some(row) = clean_record(record, i, &mut report) else {
            continue;
        };
        if !seen.insert(row.company_number.clone()) {
            report.duplicates += 1;
            continue;
        }
        cleaned.push(row);
    }

    info!(
        "Cleaned {} of {} rows ({} dropped, {} dates flagged)",
        cleaned.len(),
        report.rows_read,
        report.dropped(),
        report.unparsed_dates
    );
    AnalysisDataset {
        records: cleaned,
        report,
    }
}

fn clean_record(record: CompanyRecord, index: usize, report: &mut CleanReport) -> Option<CleanRecord> {
    let Some(company_number) = record.company_number.as_deref().and_then(normalize_company_number) else {
        warn!("Row {}: missing company number, dropped", index + 1);
        report.missing_number += 1;
        return None;
    };
    let Some(company_name) = text(record.company_name) else {
        warn!("Row {} ({}): missing company name, dropped", index + 1, company_number);
        report.missing_name += 1;
        return None;
    };

    let incorporation_date = clean_date(record.incorporation_date, &company_number, report);
    let dissolution_date = clean_date(record.dissolution_date, &company_number, report);

    Some(CleanRecord {
        company_name,
        company_number,
        status: record.status.as_deref().and_then(parse_status),
        company_type: record.company_type.as_deref().and_then(parse_company_type),
        incorporation_date,
        dissolution_date,
        sic_codes: normalize_sic_codes(&record.sic_codes),
        address_line_1: text(record.address_line_1),
        address_line_2: text(record.address_line_2),
        city: text(record.city).map(|c| title_case(&c)),
        postal_code: record.postal_code.as_deref().and_then(normalize_postal_code),
        region: text(record.region),
        country: text(record.country),
    })
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}

fn clean_date(raw: Option<String>, company_number: &str, report: &mut CleanReport) -> Option<NaiveDate> {
    let raw = text(raw)?;
    let parsed = parse_date(&raw);
    if parsed.is_none() {
        warn!("{}: unparseable date '{}' flagged", company_number, raw);
        report.unparsed_dates += 1;
    }
    parsed
}

/// Upper-cases and strips spaces; purely numeric numbers are zero-padded to eight digits.
pub fn normalize_company_number(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if compact.is_empty() {
        None
    } else if compact.len() < 8 && compact.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("{:0>8}", compact))
    } else {
        Some(compact)
    }
}

/// UK postcodes become `OUTWARD INWARD` in upper case; anything else is only
/// upper-cased with its whitespace collapsed.
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if compact.is_empty() {
        return None;
    }
    if let Some(split) = uk_inward_split(&compact) {
        return Some(format!("{} {}", &compact[..split], &compact[split..]));
    }
    Some(collapse_whitespace(raw).to_uppercase())
}

/// Byte offset of the inward code in an unspaced UK postcode (`SW1A1AA` -> 4).
/// `None` unless the code starts with a letter and ends in digit, letter, letter.
pub fn uk_inward_split(compact: &str) -> Option<usize> {
    let bytes = compact.as_bytes();
    if !(5..=7).contains(&bytes.len()) || !bytes.iter().all(u8::is_ascii_alphanumeric) {
        return None;
    }
    let split = bytes.len() - 3;
    let inward = &bytes[split..];
    let shaped = bytes[0].is_ascii_alphabetic()
        && inward[0].is_ascii_digit()
        && inward[1].is_ascii_alphabetic()
        && inward[2].is_ascii_alphabetic();
    shaped.then_some(split)
}

fn vocab_key(raw: &str) -> String {
    collapse_whitespace(raw)
        .to_lowercase()
        .replace([' ', '_'], "-")
}

/// Maps a status onto the registry vocabulary. Unknown values are kept as read.
pub fn parse_status(raw: &str) -> Option<CompanyStatus> {
    let trimmed = collapse_whitespace(raw);
    if trimmed.is_empty() {
        return None;
    }
    let status = match vocab_key(&trimmed).as_str() {
        "active" | "live" => CompanyStatus::Active,
        "dissolved" => CompanyStatus::Dissolved,
        "liquidation" | "in-liquidation" => CompanyStatus::Liquidation,
        "receivership" | "in-receivership" | "receiver-action" => CompanyStatus::Receivership,
        "administration" | "in-administration" => CompanyStatus::Administration,
        "voluntary-arrangement" => CompanyStatus::VoluntaryArrangement,
        "converted-closed" | "converted/closed" => CompanyStatus::ConvertedClosed,
        "insolvency-proceedings" => CompanyStatus::InsolvencyProceedings,
        "open" => CompanyStatus::Open,
        "closed" => CompanyStatus::Closed,
        "registered" => CompanyStatus::Registered,
        "removed" => CompanyStatus::Removed,
        _ => CompanyStatus::Other(trimmed),
    };
    Some(status)
}

/// Maps a company type code or description onto the registry vocabulary.
pub fn parse_company_type(raw: &str) -> Option<CompanyType> {
    let trimmed = collapse_whitespace(raw);
    if trimmed.is_empty() {
        return None;
    }
    let company_type = match vocab_key(&trimmed).as_str() {
        "ltd" | "limited" | "private-limited-company" => CompanyType::Ltd,
        "plc" | "public-limited-company" => CompanyType::Plc,
        "llp" | "limited-liability-partnership" => CompanyType::Llp,
        "private-unlimited" | "private-unlimited-company" => CompanyType::PrivateUnlimited,
        "private-unlimited-nsc" => CompanyType::PrivateUnlimitedNsc,
        "private-limited-guarant-nsc" | "private-limited-by-guarantee-without-share-capital" => {
            CompanyType::PrivateLimitedGuarantNsc
        }
        "private-limited-guarant-nsc-limited-exemption" => {
            CompanyType::PrivateLimitedGuarantNscLimitedExemption
        }
        "private-limited-shares-section-30-exemption" => {
            CompanyType::PrivateLimitedSharesSection30Exemption
        }
        "limited-partnership" => CompanyType::LimitedPartnership,
        "charitable-incorporated-organisation" | "cio" => {
            CompanyType::CharitableIncorporatedOrganisation
        }
        "registered-society-non-jurisdictional" | "registered-society" => {
            CompanyType::RegisteredSocietyNonJurisdictional
        }
        "oversea-company" | "overseas-company" => CompanyType::OverseaCompany,
        _ => CompanyType::Other(trimmed),
    };
    Some(company_type)
}

/// Trims codes, drops empties and repeats, keeps first-seen order.
pub fn normalize_sic_codes(codes: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .iter()
        .flat_map(|c| c.split(','))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(c.to_string()))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CsvRow;

    fn raw(number: Option<&str>, name: Option<&str>) -> CompanyRecord {
        CompanyRecord {
            company_name: name.map(String::from),
            company_number: number.map(String::from),
            status: Some(" Active ".into()),
            company_type: Some("Private limited company".into()),
            incorporation_date: Some("02/11/2015".into()),
            dissolution_date: None,
            sic_codes: vec!["87100".into(), " 87300".into(), "87100".into()],
            address_line_1: Some("  1   High Street ".into()),
            address_line_2: Some("   ".into()),
            city: Some("BIRMINGHAM".into()),
            postal_code: Some("b11aa".into()),
            region: Some("West Midlands".into()),
            country: Some("England".into()),
        }
    }

    #[test]
    fn normalizes_fields() {
        let dataset = clean_all(vec![raw(Some("9876543"), Some("  CARE   PLUS LTD "))]);
        let r = &dataset.records[0];

        assert_eq!(r.company_number, "09876543");
        assert_eq!(r.company_name, "CARE PLUS LTD");
        assert_eq!(r.status, Some(CompanyStatus::Active));
        assert_eq!(r.company_type, Some(CompanyType::Ltd));
        assert_eq!(r.incorporation_date, NaiveDate::from_ymd_opt(2015, 11, 2));
        assert_eq!(r.sic_codes, vec!["87100", "87300"]);
        assert_eq!(r.address_line_1.as_deref(), Some("1 High Street"));
        assert_eq!(r.address_line_2, None);
        assert_eq!(r.city.as_deref(), Some("Birmingham"));
        assert_eq!(r.postal_code.as_deref(), Some("B1 1AA"));
    }

    #[test]
    fn rows_missing_registration_number_are_dropped() {
        // N = 5, K = 2
        let rows = vec![
            raw(Some("00000001"), Some("A")),
            raw(None, Some("B")),
            raw(Some("00000003"), Some("C")),
            raw(Some("   "), Some("D")),
            raw(Some("00000005"), Some("E")),
        ];
        let dataset = clean_all(rows);
        assert_eq!(dataset.records.len(), 5 - 2);
        assert_eq!(dataset.report.missing_number, 2);
        assert_eq!(dataset.report.rows_read, 5);
    }

    #[test]
    fn rows_missing_name_are_dropped() {
        let dataset = clean_all(vec![raw(Some("1"), None), raw(Some("2"), Some(""))]);
        assert!(dataset.records.is_empty());
        assert_eq!(dataset.report.missing_name, 2);
    }

    #[test]
    fn duplicate_numbers_keep_first() {
        let dataset = clean_all(vec![
            raw(Some("123"), Some("First")),
            raw(Some("00000123"), Some("Second")),
        ]);
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].company_name, "First");
        assert_eq!(dataset.report.duplicates, 1);
    }

    #[test]
    fn bad_dates_are_flagged_not_dropped() {
        let mut row = raw(Some("1"), Some("A"));
        row.incorporation_date = Some("sometime in 2015".into());
        let dataset = clean_all(vec![row]);
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].incorporation_date, None);
        assert_eq!(dataset.report.unparsed_dates, 1);
    }

    #[test]
    fn status_vocabulary() {
        assert_eq!(parse_status("ACTIVE"), Some(CompanyStatus::Active));
        assert_eq!(parse_status("In Liquidation"), Some(CompanyStatus::Liquidation));
        assert_eq!(parse_status("voluntary_arrangement"), Some(CompanyStatus::VoluntaryArrangement));
        assert_eq!(
            parse_status("Active - Proposal to Strike off"),
            Some(CompanyStatus::Other("Active - Proposal to Strike off".into()))
        );
        assert_eq!(parse_status("  "), None);
    }

    #[test]
    fn company_type_vocabulary() {
        assert_eq!(parse_company_type("LLP"), Some(CompanyType::Llp));
        assert_eq!(parse_company_type("public limited company"), Some(CompanyType::Plc));
        assert_eq!(
            parse_company_type("community-interest-thing"),
            Some(CompanyType::Other("community-interest-thing".into()))
        );
    }

    #[test]
    fn every_registry_code_maps_to_itself() {
        for status in CompanyStatus::KNOWN {
            assert_eq!(parse_status(status.code()), Some(status.clone()));
            assert_eq!(parse_status(&status.label()), Some(status));
        }
        for company_type in CompanyType::KNOWN {
            assert_eq!(parse_company_type(company_type.code()), Some(company_type));
        }
    }

    #[test]
    fn postal_codes() {
        assert_eq!(normalize_postal_code("sw1a1aa").as_deref(), Some("SW1A 1AA"));
        assert_eq!(normalize_postal_code(" e1  6an ").as_deref(), Some("E1 6AN"));
        assert_eq!(normalize_postal_code("B1 1AA").as_deref(), Some("B1 1AA"));
        assert_eq!(normalize_postal_code("bfpo 1234 x").as_deref(), Some("BFPO 1234 X"));
        assert_eq!(normalize_postal_code(""), None);
        // only the UK shape is re-spaced
        assert_eq!(normalize_postal_code("12345").as_deref(), Some("12345"));
        assert_eq!(normalize_postal_code("75008ab").as_deref(), Some("75008AB"));
        assert_eq!(normalize_postal_code("abcdef").as_deref(), Some("ABCDEF"));
        assert_eq!(normalize_postal_code("m11ae").as_deref(), Some("M1 1AE"));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let mut odd = raw(Some("sc123456"), Some("Odd Status Ltd"));
        odd.status = Some("Active - Proposal to Strike off".into());
        odd.company_type = Some("something-new".into());
        odd.incorporation_date = Some("2001-01-31T00:00:00Z".into());
        odd.dissolution_date = Some("31-12-2020".into());

        let first = clean_all(vec![
            raw(Some("42"), Some("A Ltd")),
            raw(None, Some("Nameless Number")),
            odd,
        ]);

        // back through the csv row shape, as a cleaned file would be re-read
        let again: Vec<CompanyRecord> = first
            .records
            .iter()
            .map(|r| CompanyRecord::from(CsvRow::from(r)))
            .collect();
        let second = clean_all(again);

        assert_eq!(second.records, first.records);
        assert_eq!(second.report.dropped(), 0);
        assert_eq!(second.report.unparsed_dates, 0);
    }

    #[test]
    fn same_input_same_output() {
        let rows = || vec![raw(Some("3"), Some("C")), raw(Some("1"), Some("A")), raw(Some("2"), Some("B"))];
        assert_eq!(clean_all(rows()).records, clean_all(rows()).records);
    }
}
