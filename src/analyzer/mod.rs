// Analyzer module: aggregates submodules for grouped counts, ages and trends.

pub mod age;
pub mod aggregates;
pub mod trends;

// Re-export the main entry points for ease of use.
pub use age::AgeBucket;
pub use aggregates::{Aggregates, Counts, RankLabel, TREND_START_YEAR, postal_prefix, ranked, top_n};
