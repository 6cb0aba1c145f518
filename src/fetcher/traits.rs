use crate::model::{FetchError, SearchQuery};

/// A source of raw search-result pages.
pub trait SearchApi {
    /// Returns the raw body of the page starting at `start_index`.
    fn fetch_page(&self, query: &SearchQuery, start_index: u64) -> Result<String, FetchError>;
}
