use crate::fetcher::traits::SearchApi;
use crate::model::{FetchError, SearchQuery};
use crate::utils::mask_key;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Company looked up once to check the api key before searching.
const AUTH_CHECK_COMPANY: &str = "00000006";

pub struct CompaniesHouseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CompaniesHouseClient {
    pub fn new(base_url: &str, api_key: String, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(concat!("agency-scout/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        info!("Using API key: {}", mask_key(&api_key));
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.api_key, None::<&str>)
            .header(ACCEPT, "application/json")
            .query(params)
            .send()?;
        Ok(response)
    }

    /// Single lookup that fails fast on a rejected key. Other failures are only logged.
    pub fn check_auth(&self) -> Result<(), FetchError> {
        let url = format!("{}/company/{}", self.base_url, AUTH_CHECK_COMPANY);
        info!("Testing authentication...");
        let response = match self.get(&url, &[]) {
            Ok(response) => response,
            Err(e) => {
                warn!("Auth check failed: {}", e);
                return Ok(());
            }
        };
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized(status.as_u16()));
        }
        if status.is_success() {
            info!("Authentication OK [{}]", status);
        } else {
            let body = response.text().unwrap_or_default();
            warn!("Auth check responded [{}]: {}", status, truncate(&body, 200));
        }
        Ok(())
    }
}

/// Query parameters of the advanced company search.
pub fn search_params(query: &SearchQuery, start_index: u64) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("sic_codes", query.sic_codes.join(",")),
        ("location", query.location.clone()),
        ("size", query.page_size.to_string()),
        ("start_index", start_index.to_string()),
    ];
    if let Some(status) = &query.company_status {
        params.push(("company_status", status.clone()));
    }
    params
}

impl SearchApi for CompaniesHouseClient {
    fn fetch_page(&self, query: &SearchQuery, start_index: u64) -> Result<String, FetchError> {
        let url = format!("{}/advanced-search/companies", self.base_url);
        let params = search_params(query, start_index);
        debug!("GET {} {:?}", url, params);

        let response = self.get(&url, &params)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        Ok(response.text()?)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Field order matters: the server is dropped before its runtime.
    struct Stub {
        server: MockServer,
        runtime: Runtime,
    }

    impl Stub {
        fn start() -> Self {
            let runtime = Runtime::new().unwrap();
            let server = runtime.block_on(MockServer::start());
            Stub { server, runtime }
        }

        fn respond(&self, route: &str, template: ResponseTemplate) {
            self.runtime.block_on(
                Mock::given(method("GET"))
                    .and(path(route))
                    .respond_with(template)
                    .mount(&self.server),
            );
        }

        fn client(&self) -> CompaniesHouseClient {
            CompaniesHouseClient::new(&self.server.uri(), "key".into(), Some(Duration::from_secs(5))).unwrap()
        }
    }

    fn query(status: Option<&str>) -> SearchQuery {
        SearchQuery {
            location: "Birmingham".into(),
            sic_codes: vec!["87100".into(), "87300".into()],
            company_status: status.map(String::from),
            page_size: 100,
        }
    }

    #[test]
    fn search_params_join_sic_codes() {
        let params = search_params(&query(Some("active")), 200);
        assert!(params.contains(&("sic_codes", "87100,87300".to_string())));
        assert!(params.contains(&("location", "Birmingham".to_string())));
        assert!(params.contains(&("size", "100".to_string())));
        assert!(params.contains(&("start_index", "200".to_string())));
        assert!(params.contains(&("company_status", "active".to_string())));
    }

    #[test]
    fn status_filter_is_optional() {
        let params = search_params(&query(None), 0);
        assert!(params.iter().all(|(k, _)| *k != "company_status"));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = CompaniesHouseClient::new("https://example.test/", "key".into(), None).unwrap();
        assert_eq!(client.base_url, "https://example.test");
    }

    #[test]
    fn rejected_key_fails_the_auth_check() {
        let stub = Stub::start();
        stub.respond("/company/00000006", ResponseTemplate::new(401));
        let err = stub.client().check_auth().unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized(401)), "{err}");
    }

    #[test]
    fn auth_check_only_logs_other_statuses() {
        let stub = Stub::start();
        stub.respond("/company/00000006", ResponseTemplate::new(404).set_body_string("not found"));
        assert!(stub.client().check_auth().is_ok());
    }

    #[test]
    fn auth_check_survives_unreachable_host() {
        let client = CompaniesHouseClient::new("http://127.0.0.1:1", "key".into(), Some(Duration::from_secs(2))).unwrap();
        assert!(client.check_auth().is_ok());
    }

    #[test]
    fn forbidden_search_page_is_unauthorized() {
        let stub = Stub::start();
        stub.respond("/advanced-search/companies", ResponseTemplate::new(403));
        let err = stub.client().fetch_page(&query(None), 0).unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized(403)), "{err}");
    }

    #[test]
    fn server_error_keeps_a_truncated_body() {
        let stub = Stub::start();
        stub.respond(
            "/advanced-search/companies",
            ResponseTemplate::new(500).set_body_string("x".repeat(2000)),
        );
        match stub.client().fetch_page(&query(None), 0) {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), 500);
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn search_page_sends_auth_and_params() {
        let stub = Stub::start();
        stub.runtime.block_on(
            Mock::given(method("GET"))
                .and(path("/advanced-search/companies"))
                .and(header("authorization", "Basic a2V5Og=="))
                .and(query_param("sic_codes", "87100,87300"))
                .and(query_param("start_index", "100"))
                .and(query_param("company_status", "active"))
                .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"hits":0}"#))
                .mount(&stub.server),
        );
        let body = stub.client().fetch_page(&query(Some("active")), 100).unwrap();
        assert_eq!(body, r#"{"hits":0}"#);
    }
}
