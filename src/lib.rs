pub mod analyzer;
pub mod config;
pub mod fetcher;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod reporter;
pub mod storage;
pub mod utils;
pub mod visualizer;
