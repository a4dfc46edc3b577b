//! Progress reporting
//!
//! Every component that does observable work receives a [`Reporter`] and
//! emits plain-text [`LogEvent`]s through it. The reporter hands each event to
//! the caller-supplied sink (if any) in the order the work happens, and
//! mirrors it to `tracing` so the binary can persist it to a log file.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Severity of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress line
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.severity,
            self.message
        )
    }
}

/// Callback receiving progress events, one line at a time
pub type LogSink = Arc<dyn Fn(&LogEvent) + Send + Sync>;

/// Emits progress events to an optional sink and to `tracing`
#[derive(Clone, Default)]
pub struct Reporter {
    sink: Option<LogSink>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Reporter {
    /// Reporter that forwards every event to `sink`
    pub fn new(sink: LogSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Reporter with no sink; events only reach `tracing`
    pub fn silent() -> Self {
        Self::default()
    }

    /// Convenience constructor from a closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        Self::new(Arc::new(f))
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(Severity::Debug, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Severity::Info, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(Severity::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Severity::Error, message.into());
    }

    fn emit(&self, severity: Severity, message: String) {
        match severity {
            Severity::Debug => debug!("{}", message),
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }

        if let Some(sink) = &self.sink {
            let event = LogEvent {
                severity,
                message,
                timestamp: Local::now(),
            };
            sink(&event);
        }
    }
}
