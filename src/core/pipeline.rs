use crate::adapters::csv_source::CsvLoader;
use crate::adapters::sinks::write_table;
use crate::core::{aggregator, cleaner};
use crate::domain::model::{FailedWrite, LoadOutcome, OutputTarget, Table, TransformResult};
use crate::domain::ports::{ConfigProvider, Pipeline, Reporter, Storage};
use crate::utils::logger::TracingReporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads the sales CSV, cleans it, optionally summarizes it by category and
/// writes the configured outputs.
pub struct SalesPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    reporter: Arc<dyn Reporter>,
}

impl<S: Storage, C: ConfigProvider> SalesPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn output_path(&self, target: &OutputTarget) -> PathBuf {
        Path::new(self.config.output_dir()).join(&target.filename)
    }

    fn write(&self, table: &Table, target: &OutputTarget, outcome: &mut LoadOutcome) {
        let path = self.output_path(target);
        match write_table(&self.storage, table, &path, target.format) {
            Ok(()) => {
                self.reporter.info(
                    &format!("Table successfully saved to {} at {}", target.format, path.display()),
                    &[("rows", table.len().to_string())],
                );
                outcome.written.push(path);
            }
            Err(e) => {
                e.report(self.reporter.as_ref());
                outcome.failed.push(FailedWrite {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }
}

impl<S: Storage, C: ConfigProvider> Pipeline for SalesPipeline<S, C> {
    fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    fn extract(&self) -> Table {
        CsvLoader::new(&self.storage)
            .with_delimiter(self.config.delimiter())
            .load(Path::new(self.config.input_path()), self.reporter.as_ref())
    }

    fn transform(&self, table: &Table) -> TransformResult {
        let cleaned = cleaner::clean(table, self.reporter.as_ref());
        let summary = match self.config.summary_output() {
            Some(_) if !cleaned.is_empty() => {
                Some(aggregator::summarize(&cleaned, self.reporter.as_ref()))
            }
            _ => None,
        };
        TransformResult { cleaned, summary }
    }

    fn load(&self, result: &TransformResult) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();

        self.write(&result.cleaned, self.config.cleaned_output(), &mut outcome);

        if let (Some(summary), Some(target)) = (&result.summary, self.config.summary_output()) {
            self.write(&summary.to_table(), target, &mut outcome);
        }

        outcome
    }

    fn finish(&self, succeeded: bool) {
        if !succeeded || !self.config.delete_input_on_success() {
            return;
        }

        let input = Path::new(self.config.input_path());
        match self.storage.remove_file(input) {
            Ok(()) => self.reporter.info(
                &format!("Removed input file {}", input.display()),
                &[("path", input.display().to_string())],
            ),
            Err(e) => self.reporter.warn(
                &format!("Could not remove input file {}: {}", input.display(), e),
                &[("path", input.display().to_string())],
            ),
        }
    }
}
