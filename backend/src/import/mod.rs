//! Import orchestration: validate -> map -> submit, one row at a time.
//!
//! # State machine
//!
//! ```text
//!   Idle ──run()──▶ Running ──all rows attempted──▶ Completed
//!                     ▲                                 │
//!                     └────────────run()────────────────┘
//! ```
//!
//! `Running` is only entered when pre-flight validation returns no error;
//! a blocked run leaves the state untouched. A second `run()` while one is
//! `Running` is rejected with [`ImportError::AlreadyRunning`].
//!
//! Submissions are strictly sequential. Each row is submitted at most once,
//! a failed row never stops the rows after it, and nothing is retried.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::api::logs::{LogLevel, RunLog};
use crate::error::{ApiError, ImportError};
use crate::models::{ExternalRefs, ImportResult, RowMapping};
use crate::records::RecordKind;
use crate::transform::Payload;
use crate::validation::validate;

/// Per-record create call of the remote collaborator.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn submit(&self, payload: &Payload) -> Result<(), ApiError>;
}

/// Lifecycle of the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportState {
    Idle,
    Running,
    Completed,
}

/// Owns the run state; share one per console session.
#[derive(Debug)]
pub struct Importer {
    state: Mutex<ImportState>,
}

impl Importer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ImportState::Idle),
        }
    }

    pub fn state(&self) -> ImportState {
        *self.lock()
    }

    /// Validate `rows`, then submit each one through `sink`.
    pub async fn run<S>(
        &self,
        rows: &[RowMapping],
        kind: RecordKind,
        refs: &ExternalRefs,
        sink: &S,
    ) -> Result<ImportResult, ImportError>
    where
        S: RecordSink + ?Sized,
    {
        let log = RunLog::new(Uuid::new_v4().to_string());
        self.run_logged(rows, kind, refs, sink, &log).await
    }

    /// [`Importer::run`] with a caller-chosen progress log (job id).
    pub async fn run_logged<S>(
        &self,
        rows: &[RowMapping],
        kind: RecordKind,
        refs: &ExternalRefs,
        sink: &S,
        log: &RunLog,
    ) -> Result<ImportResult, ImportError>
    where
        S: RecordSink + ?Sized,
    {
        let errors = validate(rows, kind, refs);
        if !errors.is_empty() {
            log.warning(format!("Import blocked: {} validation error(s)", errors.len()));
            return Err(ImportError::Blocked(errors));
        }

        let _running = self.begin()?;

        log.info(format!("Importing {} {}...", rows.len(), kind.plural()));
        let mut result = ImportResult::default();

        for (i, row) in rows.iter().enumerate() {
            let position = i + 1;

            let payload = match kind.to_payload(row, refs) {
                Ok(payload) => payload,
                Err(err) => {
                    let identifier = row.trimmed(kind.identifier_header());
                    log.row(LogLevel::Error, format!("Row {}: {}", position, err.message));
                    result.record_failure(failure_message(position, &identifier));
                    continue;
                }
            };

            match sink.submit(&payload).await {
                Ok(()) => {
                    log.row(
                        LogLevel::Success,
                        format!("Row {}: {} imported", position, payload.identifier()),
                    );
                    result.record_success();
                }
                Err(err) => {
                    let level = if err.is_transport() { LogLevel::Error } else { LogLevel::Warning };
                    log.row(level, format!("Row {}: {} rejected ({})", position, payload.identifier(), err));
                    result.record_failure(failure_message(position, payload.identifier()));
                }
            }
        }

        let summary = summary_message(kind, &result);
        if result.is_clean() {
            log.success(summary);
        } else {
            log.warning(summary);
        }

        Ok(result)
    }

    /// Enter `Running`, or refuse if a run is in flight.
    fn begin(&self) -> Result<RunGuard<'_>, ImportError> {
        let mut state = self.lock();
        if *state == ImportState::Running {
            return Err(ImportError::AlreadyRunning);
        }
        *state = ImportState::Running;
        Ok(RunGuard { importer: self })
    }

    fn lock(&self) -> MutexGuard<'_, ImportState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Importer {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves the importer to `Completed` when the run ends, even if the run
/// future is dropped half way.
struct RunGuard<'a> {
    importer: &'a Importer,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.importer.lock() = ImportState::Completed;
    }
}

/// `Row {i}: {identifier} - Import failed`, `i` being the 1-based position
/// in the submitted batch.
pub fn failure_message(position: usize, identifier: &str) -> String {
    format!("Row {}: {} - Import failed", position, identifier)
}

/// Terminal summary shown after a run.
pub fn summary_message(kind: RecordKind, result: &ImportResult) -> String {
    if result.is_clean() {
        format!("Successfully imported {} {}", result.succeeded, kind.plural())
    } else {
        format!("{} successful, {} failed", result.succeeded, result.failed)
    }
}
