//! Tabular decoder: spreadsheet or CSV bytes -> ordered row mappings.
//!
//! The first row of the grid is the header row; every following non-blank
//! row becomes one [`RowMapping`] keyed by the literal header strings.
//! No import-specific logic lives here.

pub mod delimited;
pub mod excel;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DecodeError, DecodeResult, ImportError, UnsupportedFile};
use crate::models::{CellValue, RowMapping};

/// A grid row: true 1-based position in the file, then its cells.
pub type GridRow = (usize, Vec<CellValue>);

/// Kind of uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Xlsx,
    Xls,
    Csv,
}

impl FileKind {
    /// Gate on the MIME type announced by the client. Parameters such as
    /// `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Result<Self, UnsupportedFile> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Ok(FileKind::Xlsx),
            "application/vnd.ms-excel" => Ok(FileKind::Xls),
            "text/csv" => Ok(FileKind::Csv),
            _ => Err(UnsupportedFile { offered: mime.to_string() }),
        }
    }

    /// Gate on the file extension.
    pub fn from_path(path: &Path) -> Result<Self, UnsupportedFile> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("xlsx") => Ok(FileKind::Xlsx),
            Some("xls") => Ok(FileKind::Xls),
            Some("csv") => Ok(FileKind::Csv),
            _ => Err(UnsupportedFile { offered: path.display().to_string() }),
        }
    }

    pub fn is_workbook(&self) -> bool {
        matches!(self, FileKind::Xlsx | FileKind::Xls)
    }
}

/// Decode raw file bytes into row mappings.
///
/// Workbook kinds are sniffed: some clients label CSV uploads as
/// `application/vnd.ms-excel`, so bytes without a zip / OLE signature are
/// read as CSV.
pub fn decode(bytes: &[u8], kind: FileKind) -> DecodeResult<Vec<RowMapping>> {
    let grid = if kind.is_workbook() && excel::looks_like_workbook(bytes) {
        excel::read_grid(bytes)?
    } else {
        delimited::read_grid(bytes)?
    };

    let rows = build_rows(grid)?;
    tracing::debug!(rows = rows.len(), ?kind, "decoded file");
    Ok(rows)
}

/// Read a file from disk, picking the decoder from its extension.
pub fn decode_path<P: AsRef<Path>>(path: P) -> Result<Vec<RowMapping>, ImportError> {
    let path = path.as_ref();
    let kind = FileKind::from_path(path)?;
    let bytes = std::fs::read(path).map_err(DecodeError::from)?;
    Ok(decode(&bytes, kind)?)
}

/// Zip headers onto each data row and drop blank rows.
pub fn build_rows(grid: Vec<GridRow>) -> DecodeResult<Vec<RowMapping>> {
    let mut grid = grid.into_iter();

    let (_, header_cells) = grid.next().ok_or(DecodeError::Empty)?;
    let headers: Vec<String> = header_cells.iter().map(CellValue::as_text).collect();

    if headers.is_empty() {
        return Err(DecodeError::Empty);
    }

    let rows: Vec<RowMapping> = grid
        .filter(|(_, cells)| cells.iter().any(|c| !c.is_blank()))
        .map(|(position, cells)| {
            headers
                .iter()
                .enumerate()
                .fold(RowMapping::new(position), |row, (i, header)| {
                    let value = cells.get(i).cloned().unwrap_or(CellValue::Empty);
                    row.with(header.clone(), value)
                })
        })
        .collect();

    if rows.is_empty() {
        return Err(DecodeError::NoDataRows);
    }

    Ok(rows)
}
