// Fetcher module: registry http client and the pagination walk over it.

pub mod client;
pub mod paginate;
pub mod traits;

pub use client::CompaniesHouseClient;
pub use paginate::{PageLimits, fetch_batch};
pub use traits::SearchApi;
