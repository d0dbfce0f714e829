//! Data models and structures for the link benchmark

pub mod config;
pub mod result;

// Re-export main model types
pub use config::{Config, TestConfiguration};
pub use result::{
    BenchmarkEvent, BenchmarkResult, MacCounters, RxCounters, TestResults, TestStatus,
};
