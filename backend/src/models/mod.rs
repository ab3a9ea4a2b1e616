//! Domain models for the import pipeline.
//!
//! - [`CellValue`] - Raw value of one spreadsheet / CSV cell
//! - [`RowMapping`] - One decoded data row (header -> cell) with its file position
//! - [`Category`] / [`ExternalRefs`] - Category lookup snapshot used by POI imports
//! - [`ImportResult`] - Success / failure accounting of one import run

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Cells
// =============================================================================

/// Raw cell value.
///
/// CSV cells are always [`CellValue::Text`] (or [`CellValue::Empty`]);
/// workbook cells keep their numeric type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Build a text cell, mapping the empty string to [`CellValue::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Undefined or empty string. Whitespace-only text is not blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Text rendering used for headers, messages and payload fields.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Numeric interpretation. Non-finite values are rejected.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Empty => return None,
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Integral floats render without a fractional part (`40`, not `40.0`).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// One decoded data row.
///
/// Headers keep their literal text, including the trailing `*` that marks
/// required columns. Immutable once the decoder hands it out.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMapping {
    /// 1-based position of the row in the source file (header is row 1).
    pub origin_row_number: usize,
    cells: Vec<(String, CellValue)>,
}

impl RowMapping {
    pub fn new(origin_row_number: usize) -> Self {
        Self {
            origin_row_number,
            cells: Vec::new(),
        }
    }

    /// Builder used by the decoder and tests. A repeated header keeps its
    /// first position and takes the latest value.
    pub fn with(mut self, header: impl Into<String>, value: CellValue) -> Self {
        self.insert(header, value);
        self
    }

    pub(crate) fn insert(&mut self, header: impl Into<String>, value: CellValue) {
        let header = header.into();
        match self.cells.iter_mut().find(|(h, _)| *h == header) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    /// Cell text, empty when the column is missing.
    pub fn text(&self, header: &str) -> String {
        self.get(header).map(CellValue::as_text).unwrap_or_default()
    }

    /// Trimmed cell text, empty when the column is missing.
    pub fn trimmed(&self, header: &str) -> String {
        self.text(header).trim().to_string()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }
}

// =============================================================================
// Category reference data
// =============================================================================

/// A category as returned by `GET /categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Read-only reference snapshot taken before validation / import.
///
/// Not refreshed during a run: a category edited concurrently is only seen
/// by the next run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalRefs {
    pub categories: Vec<Category>,
}

impl ExternalRefs {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Case-insensitive lookup by name (surrounding whitespace ignored).
    pub fn find_category(&self, name: &str) -> Option<&Category> {
        let wanted = name.trim().to_lowercase();
        self.categories
            .iter()
            .find(|c| c.name.trim().to_lowercase() == wanted)
    }

    /// Category names in reference order, as shown to users.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }
}

// =============================================================================
// Import Result
// =============================================================================

/// Aggregate outcome of one import run.
///
/// `succeeded + failed` always equals the number of rows submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub succeeded: usize,
    pub failed: usize,
    pub failure_messages: Vec<String>,
}

impl ImportResult {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failed += 1;
        self.failure_messages.push(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cells() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text(String::new()).is_blank());
        assert!(!CellValue::Text("  ".into()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(CellValue::Number(40.0).as_text(), "40");
        assert_eq!(CellValue::Number(-74.006).as_text(), "-74.006");
    }

    #[test]
    fn test_as_number_rejects_garbage() {
        assert_eq!(CellValue::text(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(CellValue::text("abc").as_number(), None);
        assert_eq!(CellValue::text("NaN").as_number(), None);
        assert_eq!(CellValue::text("inf").as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }

    #[test]
    fn test_row_mapping_repeated_header() {
        let row = RowMapping::new(2)
            .with("Name*", CellValue::text("first"))
            .with("Other", CellValue::Empty)
            .with("Name*", CellValue::text("second"));

        assert_eq!(row.iter().count(), 2);
        assert_eq!(row.text("Name*"), "second");
        assert_eq!(row.iter().next().map(|(h, _)| h), Some("Name*"));
    }

    #[test]
    fn test_row_mapping_missing_column() {
        let row = RowMapping::new(2).with("A", CellValue::text(" x "));
        assert_eq!(row.text("B"), "");
        assert_eq!(row.trimmed("A"), "x");
    }

    #[test]
    fn test_category_lookup_case_insensitive() {
        let refs = ExternalRefs::new(vec![
            Category { id: 1, name: "Library".into() },
            Category { id: 2, name: "Museum".into() },
        ]);
        assert_eq!(refs.find_category("LIBRARY").map(|c| c.id), Some(1));
        assert_eq!(refs.find_category("museum").map(|c| c.id), Some(2));
        assert!(refs.find_category("Park").is_none());
        assert_eq!(refs.category_names(), vec!["Library", "Museum"]);
    }

    #[test]
    fn test_import_result_accounting() {
        let mut result = ImportResult::default();
        result.record_success();
        result.record_failure("Row 2: x - Import failed");
        assert_eq!((result.succeeded, result.failed), (1, 1));
        assert!(!result.is_clean());
        assert_eq!(result.failure_messages, vec!["Row 2: x - Import failed"]);
    }
}
