//! `mailrec-pipeline`: record-linkage and ranking core.
//!
//! Pure pipeline crate: receives pre-fetched tables, returns ranked results.
//! No network or file IO.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod linker;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod table;

pub use config::{PipelineConfig, SortBy};
pub use engine::{
    best_files_view, recommend, unused_view, BestFilesRequest, RecommendRequest, SourceTables, UnusedRequest,
};
pub use error::PipelineError;
pub use model::Outcome;
pub use normalize::normalize;
pub use table::{Cell, Table};

#[cfg(test)]
pub(crate) fn proptest_config() -> proptest::prelude::ProptestConfig {
    proptest::prelude::ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..proptest::prelude::ProptestConfig::default()
    }
}
