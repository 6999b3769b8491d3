use crate::domain::model::LoadOutcome;
use crate::domain::ports::Pipeline;
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Loaded,
    Cleaned,
    Written,
    Aborted,
    End,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Start => "start",
            PipelineState::Loaded => "loaded",
            PipelineState::Cleaned => "cleaned",
            PipelineState::Written => "written",
            PipelineState::Aborted => "aborted",
            PipelineState::End => "end",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The loader produced no rows.
    NoData,
    /// Every row was dropped or filtered during cleaning.
    NoValidData,
}

impl AbortReason {
    pub fn message(&self) -> &'static str {
        match self {
            AbortReason::NoData => "Pipeline aborted: no data loaded",
            AbortReason::NoValidData => {
                "Pipeline aborted: no valid data after cleaning, skipping output generation"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    CompletedWithWriteFailures,
    Aborted(AbortReason),
}

impl RunStatus {
    /// Process exit code. Without `strict` every run exits 0 and the outcome
    /// is only visible in the logs.
    pub fn exit_code(&self, strict: bool) -> i32 {
        match (self, strict) {
            (_, false) | (RunStatus::Completed, true) => 0,
            (RunStatus::CompletedWithWriteFailures, true) => 1,
            (RunStatus::Aborted(_), true) => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub states: Vec<PipelineState>,
    pub status: RunStatus,
    pub rows_extracted: usize,
    pub rows_cleaned: usize,
    pub categories: Option<usize>,
    pub outputs: LoadOutcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Drives a [`Pipeline`] through `Start → Loaded → Cleaned → Written | Aborted → End`.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    fn transition(&self, states: &mut Vec<PipelineState>, next: PipelineState) {
        let from = states.last().copied();
        states.push(next);
        self.pipeline.reporter().debug(
            &format!("Pipeline state -> {}", next),
            &[
                ("from", from.map(|s| s.to_string()).unwrap_or_default()),
                ("to", next.to_string()),
            ],
        );
    }

    pub fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let reporter = self.pipeline.reporter();
        let mut states = vec![PipelineState::Start];

        reporter.info(
            "Starting sales data ETL pipeline",
            &[("started_at", started_at.to_rfc3339())],
        );

        let mut report = RunReport {
            started_at,
            elapsed: Duration::ZERO,
            states: Vec::new(),
            status: RunStatus::Aborted(AbortReason::NoData),
            rows_extracted: 0,
            rows_cleaned: 0,
            categories: None,
            outputs: LoadOutcome::default(),
        };

        let raw = self.pipeline.extract();
        self.monitor.log_stats("extract");
        report.rows_extracted = raw.len();

        let status = if raw.is_empty() {
            RunStatus::Aborted(AbortReason::NoData)
        } else {
            self.transition(&mut states, PipelineState::Loaded);

            let result = self.pipeline.transform(&raw);
            self.monitor.log_stats("transform");
            report.rows_cleaned = result.cleaned.len();
            report.categories = result.summary.as_ref().map(|summary| summary.len());

            if result.cleaned.is_empty() {
                RunStatus::Aborted(AbortReason::NoValidData)
            } else {
                self.transition(&mut states, PipelineState::Cleaned);

                report.outputs = self.pipeline.load(&result);
                self.monitor.log_stats("load");
                self.transition(&mut states, PipelineState::Written);

                if report.outputs.failed.is_empty() {
                    RunStatus::Completed
                } else {
                    RunStatus::CompletedWithWriteFailures
                }
            }
        };

        if let RunStatus::Aborted(reason) = status {
            self.transition(&mut states, PipelineState::Aborted);
            reporter.error(reason.message(), &[]);
        }

        self.pipeline.finish(status == RunStatus::Completed);
        self.transition(&mut states, PipelineState::End);

        report.status = status;
        report.states = states;
        report.elapsed = clock.elapsed();
        self.monitor.log_final_stats();

        reporter.info(
            "Sales data ETL pipeline finished",
            &[
                ("status", format!("{:?}", report.status)),
                ("rows_extracted", report.rows_extracted.to_string()),
                ("rows_cleaned", report.rows_cleaned.to_string()),
                ("written", report.outputs.written.len().to_string()),
                ("elapsed_ms", report.elapsed.as_millis().to_string()),
            ],
        );
        report
    }
}
