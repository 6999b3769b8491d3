pub mod aggregator;
pub mod cleaner;
pub mod etl;
pub mod pipeline;

pub use crate::domain::model::{Record, Table, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Reporter, Storage};
pub use crate::utils::error::Result;
