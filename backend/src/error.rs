//! Error types for the Vista import pipeline.
//!
//! Errors are split per layer:
//!
//! - [`DecodeError`] - spreadsheet / CSV decoding errors
//! - [`UnsupportedFile`] - file type rejected before decoding
//! - [`ApiError`] - remote REST collaborator errors
//! - [`ImportError`] - orchestration errors (blocked runs, concurrent runs)
//! - [`TemplateError`] - template generation errors
//! - [`ConfigError`] - invalid configuration values
//! - [`ServerError`] - HTTP server errors
//!
//! Conversion between layers is done with `From` implementations so `?`
//! works across boundaries.

use thiserror::Error;

use crate::validation::ValidationError;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while turning an uploaded file into row mappings.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to read the file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("Invalid CSV format: {0}")]
    Csv(String),

    /// Malformed or unreadable workbook.
    #[error("Invalid spreadsheet: {0}")]
    Workbook(String),

    /// Workbook has no worksheet.
    #[error("Spreadsheet contains no worksheet")]
    NoSheet,

    /// No header row at all.
    #[error("File is empty")]
    Empty,

    /// Header row present but nothing below it.
    #[error("File must contain at least a header row and one data row")]
    NoDataRows,
}

impl From<csv::Error> for DecodeError {
    fn from(err: csv::Error) -> Self {
        DecodeError::Csv(err.to_string())
    }
}

// =============================================================================
// File type gate
// =============================================================================

/// Rejected upload; not a decode failure but a user-facing message.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Please select a valid Excel (.xlsx, .xls) or CSV file")]
pub struct UnsupportedFile {
    /// What was offered (MIME type or file name).
    pub offered: String,
}

// =============================================================================
// Remote API Errors
// =============================================================================

/// Errors from the remote REST collaborator.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never produced a response (DNS, connect, timeout...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON.
    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),
}

impl ApiError {
    /// Whether the failure happened below HTTP (no response received).
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None if err.is_decode() => ApiError::InvalidJson(err.to_string()),
            None => ApiError::Transport(err.to_string()),
        }
    }
}

// =============================================================================
// Import Errors (top-level)
// =============================================================================

/// Errors returned by the import orchestrator and its entry points.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Pre-flight validation found errors; nothing was submitted.
    #[error("Import blocked by {} validation error(s)", .0.len())]
    Blocked(Vec<ValidationError>),

    /// Another run is in progress on this importer.
    #[error("An import is already running")]
    AlreadyRunning,

    /// File could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// File type was rejected.
    #[error("{0}")]
    Unsupported(#[from] UnsupportedFile),

    /// Reference data could not be fetched.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

// =============================================================================
// Template Errors
// =============================================================================

/// Errors while generating an import template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Workbook writer failed.
    #[error("Failed to write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// CSV writer failed.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Buffer could not be flushed.
    #[error("Failed to write template: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid configuration value.
#[derive(Debug, Error)]
#[error("Invalid value for {key}: {message}")]
pub struct ConfigError {
    pub key: String,
    pub message: String,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket bind or serve failure.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collaborator client could not be built.
    #[error("Client setup failed: {0}")]
    Client(#[from] ApiError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for remote API operations.
pub type ApiResult<T> = Result<T, ApiError>;
