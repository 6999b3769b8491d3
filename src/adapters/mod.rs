// Adapters layer: concrete implementations for external systems (filesystem, file formats).

pub mod csv_source;
pub mod sinks;
pub mod storage;
