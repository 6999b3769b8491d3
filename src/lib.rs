pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::EtlConfig;

pub use adapters::storage::LocalStorage;
pub use crate::core::aggregator::summarize;
pub use crate::core::cleaner::{clean, MIN_TOTAL_SALES, UNKNOWN_EMAIL};
pub use crate::core::{
    etl::{EtlEngine, RunReport, RunStatus},
    pipeline::SalesPipeline,
};
pub use domain::model::{AggregateTable, CategoryRevenue, OutputFormat, Record, Table};
pub use utils::error::{EtlError, Result};
