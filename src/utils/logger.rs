use crate::domain::ports::{Level, Reporter};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected compact or json", other)),
        }
    }
}

fn default_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match (verbose, level) {
        (true, _) => EnvFilter::new("sales_etl=debug,info"),
        (false, Some(level)) => EnvFilter::new(format!("sales_etl={}", level)),
        (false, None) => EnvFilter::new("sales_etl=info"),
    })
}

/// Installs the global subscriber. Call once at process start.
pub fn init_logger(verbose: bool, format: LogFormat, level: Option<&str>) {
    let filter = default_filter(verbose, level);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .init(),
    }
}

/// Forwards pipeline events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

fn render_context(context: &[(&str, String)]) -> String {
    context
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Reporter for TracingReporter {
    fn record(&self, level: Level, message: &str, context: &[(&str, String)]) {
        if context.is_empty() {
            match level {
                Level::Debug => tracing::debug!("{}", message),
                Level::Info => tracing::info!("{}", message),
                Level::Warn => tracing::warn!("{}", message),
                Level::Error => tracing::error!("{}", message),
            }
            return;
        }

        let context = render_context(context);
        match level {
            Level::Debug => tracing::debug!(context = %context, "{}", message),
            Level::Info => tracing::info!(context = %context, "{}", message),
            Level::Warn => tracing::warn!(context = %context, "{}", message),
            Level::Error => tracing::error!(context = %context, "{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportedEvent {
    pub level: Level,
    pub message: String,
    pub context: Vec<(String, String)>,
}

impl ReportedEvent {
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps every event in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: std::sync::Mutex<Vec<ReportedEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events whose `condition` context matches `condition`.
    pub fn conditions(&self, condition: &str) -> Vec<ReportedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.context_value("condition") == Some(condition))
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn record(&self, level: Level, message: &str, context: &[(&str, String)]) {
        if let Ok(mut events) = self.events.lock() {
            events.push(ReportedEvent {
                level,
                message: message.to_string(),
                context: context
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            });
        }
    }
}
