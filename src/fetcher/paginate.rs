use crate::fetcher::traits::SearchApi;
use crate::model::{CompanyRecord, FetchBatch, PartialFetch, SearchQuery};
use crate::parser::Parser;

use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PageLimits {
    /// Safety cap on the number of page requests per run.
    pub max_pages: u32,
    /// Keep only records whose registered address mentions the query location.
    pub strict_location: bool,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_pages: 50,
            strict_location: false,
        }
    }
}

/// Walks the search pages until the api runs out of results or `max_pages` is reached.
///
/// Any page failure stops the walk; the records gathered so far come back inside
/// the `PartialFetch` error. Company numbers seen on an earlier page are skipped.
pub fn fetch_batch<A, P>(
    api: &A,
    parser: &P,
    query: &SearchQuery,
    limits: &PageLimits,
) -> Result<FetchBatch, PartialFetch>
where
    A: SearchApi + ?Sized,
    P: Parser + ?Sized,
{
    let mut batch = FetchBatch::new(query);
    let mut seen: HashSet<String> = HashSet::new();
    let location = query.location.to_lowercase();
    let page_size = u64::from(query.page_size.max(1));
    let mut start_index: u64 = 0;

    info!(
        "Searching SIC codes [{}] in {}",
        query.sic_codes.join(", "),
        query.location
    );

    loop {
        if batch.pages as u32 >= limits.max_pages {
            warn!(
                "Page limit ({}) reached, stopping with {} records",
                limits.max_pages,
                batch.records.len()
            );
            break;
        }

        let page = match api
            .fetch_page(query, start_index)
            .and_then(|body| parser.parse(&body))
        {
            Ok(page) => page,
            Err(source) => return Err(PartialFetch { batch, source }),
        };
        batch.pages += 1;

        let received = page.items.len() as u64;
        info!(
            "Page {}: {} companies (start_index {}, hits {:?})",
            batch.pages, received, start_index, page.hits
        );

        for record in page.items {
            if limits.strict_location && !matches_location(&record, &location) {
                continue;
            }
            if let Some(number) = &record.company_number {
                if !seen.insert(number.clone()) {
                    warn!("Duplicate company number {} skipped", number);
                    continue;
                }
            }
            batch.records.push(record);
        }

        if received == 0 {
            break;
        }
        start_index += received;
        if let Some(hits) = page.hits {
            if start_index >= hits {
                break;
            }
        } else if received < page_size {
            break;
        }
    }

    info!(
        "Fetch finished: {} companies over {} pages",
        batch.records.len(),
        batch.pages
    );
    Ok(batch)
}

fn matches_location(record: &CompanyRecord, location_lower: &str) -> bool {
    record.address_text().to_lowercase().contains(location_lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FetchError;
    use crate::parser::CompaniesHouseParser;
    use std::cell::RefCell;

    /// Serves canned pages by start index and records every request.
    struct FakeApi {
        pages: Vec<Result<String, u16>>,
        requests: RefCell<Vec<u64>>,
    }

    impl FakeApi {
        fn new(pages: Vec<Result<String, u16>>) -> Self {
            Self {
                pages,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl SearchApi for FakeApi {
        fn fetch_page(&self, _query: &SearchQuery, start_index: u64) -> Result<String, FetchError> {
            let n = self.requests.borrow().len();
            self.requests.borrow_mut().push(start_index);
            match self.pages.get(n) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    status: *status,
                    body: "boom".into(),
                }),
                None => Ok(r#"{"items": []}"#.into()),
            }
        }
    }

    fn page(hits: Option<u64>, numbers: &[&str], city: &str) -> String {
        let items: Vec<serde_json::Value> = numbers
            .iter()
            .map(|n| {
                serde_json::json!({
                    "company_name": format!("COMPANY {n}"),
                    "company_number": n,
                    "company_status": "active",
                    "registered_office_address": { "locality": city }
                })
            })
            .collect();
        serde_json::json!({ "hits": hits, "items": items }).to_string()
    }

    fn query(page_size: u32) -> SearchQuery {
        SearchQuery {
            location: "Birmingham".into(),
            sic_codes: vec!["87100".into()],
            company_status: Some("active".into()),
            page_size,
        }
    }

    #[test]
    fn row_count_is_sum_of_page_counts() {
        let api = FakeApi::new(vec![
            Ok(page(Some(5), &["01", "02"], "Birmingham")),
            Ok(page(Some(5), &["03", "04"], "Birmingham")),
            Ok(page(Some(5), &["05"], "Birmingham")),
        ]);
        let batch = fetch_batch(&api, &CompaniesHouseParser::new(), &query(2), &PageLimits::default()).unwrap();

        assert_eq!(batch.records.len(), 2 + 2 + 1);
        assert_eq!(batch.pages, 3);
        assert_eq!(*api.requests.borrow(), vec![0, 2, 4]);
    }

    #[test]
    fn short_page_without_hits_ends_walk() {
        let api = FakeApi::new(vec![
            Ok(page(None, &["01", "02", "03"], "Birmingham")),
            Ok(page(None, &["04"], "Birmingham")),
            Ok(page(None, &["99"], "Birmingham")),
        ]);
        let batch = fetch_batch(&api, &CompaniesHouseParser::new(), &query(3), &PageLimits::default()).unwrap();

        assert_eq!(batch.records.len(), 4);
        assert_eq!(api.requests.borrow().len(), 2);
    }

    #[test]
    fn empty_first_page_gives_empty_batch() {
        let api = FakeApi::new(vec![Ok(page(Some(0), &[], "Birmingham"))]);
        let batch = fetch_batch(&api, &CompaniesHouseParser::new(), &query(10), &PageLimits::default()).unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.pages, 1);
    }

    #[test]
    fn page_limit_caps_requests() {
        let pages = (0..10)
            .map(|i| {
                let number = format!("{i:02}");
                Ok(page(Some(1000), &[number.as_str()], "Birmingham"))
            })
            .collect();
        let api = FakeApi::new(pages);
        let limits = PageLimits {
            max_pages: 3,
            ..PageLimits::default()
        };
        let batch = fetch_batch(&api, &CompaniesHouseParser::new(), &query(1), &limits).unwrap();

        assert_eq!(batch.pages, 3);
        assert_eq!(batch.records.len(), 3);
        assert_eq!(api.requests.borrow().len(), 3);
    }

    #[test]
    fn failure_returns_partial_batch() {
        let api = FakeApi::new(vec![
            Ok(page(Some(6), &["01", "02"], "Birmingham")),
            Err(503),
        ]);
        let err = fetch_batch(&api, &CompaniesHouseParser::new(), &query(2), &PageLimits::default()).unwrap_err();

        assert_eq!(err.batch.records.len(), 2);
        assert_eq!(err.batch.pages, 1);
        assert!(matches!(err.source, FetchError::Status { status: 503, .. }));
    }

    #[test]
    fn unparseable_page_returns_partial_batch() {
        let api = FakeApi::new(vec![
            Ok(page(Some(6), &["01", "02"], "Birmingham")),
            Ok("<html>maintenance</html>".into()),
        ]);
        let err = fetch_batch(&api, &CompaniesHouseParser::new(), &query(2), &PageLimits::default()).unwrap_err();
        assert_eq!(err.batch.records.len(), 2);
        assert!(matches!(err.source, FetchError::InvalidResponse(_)));
    }

    #[test]
    fn duplicate_numbers_are_dropped() {
        let api = FakeApi::new(vec![
            Ok(page(Some(4), &["01", "02"], "Birmingham")),
            Ok(page(Some(4), &["02", "03"], "Birmingham")),
        ]);
        let batch = fetch_batch(&api, &CompaniesHouseParser::new(), &query(2), &PageLimits::default()).unwrap();
        let numbers: Vec<_> = batch
            .records
            .iter()
            .filter_map(|r| r.company_number.as_deref())
            .collect();
        assert_eq!(numbers, vec!["01", "02", "03"]);
    }

    #[test]
    fn strict_location_filters_addresses() {
        let api = FakeApi::new(vec![
            Ok(page(Some(3), &["01", "02"], "Birmingham")),
            Ok(page(Some(3), &["03"], "Solihull")),
        ]);
        let limits = PageLimits {
            strict_location: true,
            ..PageLimits::default()
        };
        let batch = fetch_batch(&api, &CompaniesHouseParser::new(), &query(2), &limits).unwrap();
        assert_eq!(batch.records.len(), 2);
    }
}
