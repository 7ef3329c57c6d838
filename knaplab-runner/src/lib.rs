//! knaplab runner: search orchestration, batch mode, reports and export.
//!
//! This crate builds on `knaplab-core` to provide:
//! - TOML search configuration with validation and a content hash
//! - The constraint-satisfying capacity/seed search (resumable, cancellable)
//! - Deterministic batch generation, optionally on the rayon pool
//! - Instance reports with JSON, text and CSV export
//! - Tabular item import for fixed item sets

pub mod batch;
pub mod config;
pub mod export;
pub mod import;
pub mod report;
pub mod search;

pub use batch::{run_batch, BatchOptions};
pub use config::{
    BudgetTarget, Bounds, ConfigError, ConfigHash, Constraints, ItemSource, SearchConfig,
};
pub use import::{parse_items, ImportError};
pub use report::{InstanceReport, OptimalReport};
pub use search::{
    run_search, run_search_with_seed, BudgetOutcome, SearchError, SearchJob, SearchOutcome,
    SearchProgress, SearchStep,
};
