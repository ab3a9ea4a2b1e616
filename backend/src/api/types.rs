//! REST API types for console integration (camelCase JSON).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::import::summary_message;
use crate::models::{ImportResult, RowMapping};
use crate::records::RecordKind;
use crate::validation::ValidationError;

/// Rows echoed back by the preview endpoint.
pub const PREVIEW_ROWS: usize = 3;

/// Response to `POST /api/import/{kind}/preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub job_id: String,
    pub kind: RecordKind,
    /// "ready" when the file can be imported, "invalid" otherwise
    pub status: String,
    pub row_count: usize,
    pub preview: Vec<PreviewRow>,
    pub errors: Vec<ValidationError>,
    /// Errors pre-rendered as `Row {n}: {message}`.
    pub error_messages: Vec<String>,
}

impl PreviewResponse {
    pub fn new(job_id: String, kind: RecordKind, rows: &[RowMapping], errors: Vec<ValidationError>) -> Self {
        Self {
            job_id,
            kind,
            status: if errors.is_empty() { "ready" } else { "invalid" }.to_string(),
            row_count: rows.len(),
            preview: rows.iter().take(PREVIEW_ROWS).map(PreviewRow::from).collect(),
            error_messages: errors.iter().map(ToString::to_string).collect(),
            errors,
        }
    }
}

/// One decoded row, cells in header order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub row: usize,
    pub cells: Vec<PreviewCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewCell {
    pub header: String,
    pub value: String,
}

impl From<&RowMapping> for PreviewRow {
    fn from(row: &RowMapping) -> Self {
        Self {
            row: row.origin_row_number,
            cells: row
                .iter()
                .map(|(header, value)| PreviewCell {
                    header: header.to_string(),
                    value: value.as_text(),
                })
                .collect(),
        }
    }
}

/// Response to `POST /api/import/{kind}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub job_id: String,
    pub kind: RecordKind,
    /// "completed" or "completed_with_errors"
    pub status: String,
    pub summary: String,
    pub result: ImportResult,
}

impl ImportResponse {
    pub fn new(job_id: String, kind: RecordKind, result: ImportResult) -> Self {
        Self {
            job_id,
            kind,
            status: if result.is_clean() { "completed" } else { "completed_with_errors" }.to_string(),
            summary: summary_message(kind, &result),
            result,
        }
    }
}

/// Generic error body.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

/// Body returned when the pre-flight gate refuses a run.
pub fn blocked_response(errors: &[ValidationError]) -> Value {
    json!({
        "status": "blocked",
        "error": "Please fix validation errors before importing",
        "errors": errors,
        "errorMessages": errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}
