//! Record validation for imported rows.
//!
//! Pure function of its inputs: no network calls. Errors come out in row
//! order, then in rule order within a row. Every rule runs for every row;
//! nothing is short-circuited.
//!
//! # Example
//!
//! ```rust,ignore
//! use vista::{decode, validate, ExternalRefs, FileKind, RecordKind};
//!
//! let rows = decode(bytes, FileKind::Csv)?;
//! let errors = validate(&rows, RecordKind::Event, &ExternalRefs::default());
//! for err in &errors {
//!     println!("{}", err); // "Row 3: End date must be after start date"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ExternalRefs, RowMapping};
use crate::records::RecordKind;

/// One row-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// File position of the offending row.
    pub row_number: usize,
    /// Message without the `Row {n}: ` prefix.
    pub message: String,
}

impl ValidationError {
    pub fn new(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            row_number,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row_number, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate every row against the rules of `kind`.
///
/// Returns the union of all errors; an empty list means the batch may be
/// imported.
pub fn validate(rows: &[RowMapping], kind: RecordKind, refs: &ExternalRefs) -> Vec<ValidationError> {
    rows.iter()
        .flat_map(|row| kind.validate_row(row, refs))
        .collect()
}

/// Required-field check shared by all record kinds: trimmed value must be
/// non-empty. One error per missing field, in declaration order.
pub fn require(row: &RowMapping, fields: &[&str]) -> Vec<ValidationError> {
    fields
        .iter()
        .filter(|field| row.trimmed(field).is_empty())
        .map(|field| ValidationError::new(row.origin_row_number, format!("{} is required", field)))
        .collect()
}

/// Whether a required field has a value, so domain checks should run.
pub(crate) fn present(row: &RowMapping, field: &str) -> bool {
    !row.trimmed(field).is_empty()
}
