use crate::domain::model::{LoadOutcome, OutputTarget, Table, TransformResult};
use crate::utils::error::Result;
use std::path::Path;

/// Byte-level access to wherever tables live. Each call opens and closes its
/// own handle.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Sink for pipeline events. Components report through this instead of a
/// process-wide logger.
pub trait Reporter: Send + Sync {
    fn record(&self, level: Level, message: &str, context: &[(&str, String)]);

    fn debug(&self, message: &str, context: &[(&str, String)]) {
        self.record(Level::Debug, message, context);
    }

    fn info(&self, message: &str, context: &[(&str, String)]) {
        self.record(Level::Info, message, context);
    }

    fn warn(&self, message: &str, context: &[(&str, String)]) {
        self.record(Level::Warn, message, context);
    }

    fn error(&self, message: &str, context: &[(&str, String)]) {
        self.record(Level::Error, message, context);
    }
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn delimiter(&self) -> u8;
    fn output_dir(&self) -> &str;
    fn cleaned_output(&self) -> &OutputTarget;
    fn summary_output(&self) -> Option<&OutputTarget>;
    fn delete_input_on_success(&self) -> bool;
}

pub trait Pipeline {
    fn reporter(&self) -> &dyn Reporter;
    fn extract(&self) -> Table;
    fn transform(&self, table: &Table) -> TransformResult;
    fn load(&self, result: &TransformResult) -> LoadOutcome;

    /// Called once after the run ends. `succeeded` is true only for a run that
    /// wrote every output.
    fn finish(&self, _succeeded: bool) {}
}
