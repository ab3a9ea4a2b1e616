//! Import progress streaming via Server-Sent Events (SSE).
//!
//! Progress entries are published on a process-wide broadcast channel and
//! mirrored to `tracing`. Publishing never fails: with no subscriber the
//! entry is simply dropped after being traced.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Channel capacity; slow SSE clients skip entries beyond this.
const CHANNEL_CAPACITY: usize = 100;

/// Severity shown by consoles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single progress entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for per-row lines under a run header.
    #[serde(default)]
    pub indent: u8,
    /// Import run the entry belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            job_id: None,
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Global progress broadcaster.
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans progress entries out to every connected SSE client.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Trace the entry and send it to all subscribers.
    pub fn log(&self, entry: LogEntry) {
        let job = entry.job_id.as_deref().unwrap_or("-");
        match entry.level {
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(job, level = ?entry.level, "{}", entry.message)
            }
            LogLevel::Warning => tracing::warn!(job, "{}", entry.message),
            LogLevel::Error => tracing::error!(job, "{}", entry.message),
        }

        // no receivers is fine
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress logger bound to one import run.
#[derive(Debug, Clone)]
pub struct RunLog {
    job_id: String,
}

impl RunLog {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self { job_id: job_id.into() }
    }

    fn emit(&self, level: LogLevel, msg: impl Into<String>, indent: u8) {
        LOG_BROADCASTER.log(
            LogEntry::new(level, msg)
                .with_indent(indent)
                .with_job(self.job_id.clone()),
        );
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.emit(LogLevel::Info, msg, 0);
    }

    pub fn success(&self, msg: impl Into<String>) {
        self.emit(LogLevel::Success, msg, 0);
    }

    pub fn warning(&self, msg: impl Into<String>) {
        self.emit(LogLevel::Warning, msg, 0);
    }

    /// Per-row line, nested under the run header.
    pub fn row(&self, level: LogLevel, msg: impl Into<String>) {
        self.emit(level, msg, 1);
    }
}
