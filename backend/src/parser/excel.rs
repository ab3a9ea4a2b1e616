//! Workbook (.xlsx / .xls) reading through calamine. First worksheet only.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, DataType, Reader};
use chrono::{Duration, NaiveDate};

use crate::error::{DecodeError, DecodeResult};
use crate::models::{format_number, CellValue};

use super::GridRow;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Zip (xlsx) or OLE compound document (xls) signature.
pub fn looks_like_workbook(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC)
}

/// Read the first worksheet into a grid.
pub fn read_grid(bytes: &[u8]) -> DecodeResult<Vec<GridRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| DecodeError::Workbook(err.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::NoSheet)?
        .map_err(|err| DecodeError::Workbook(err.to_string()))?;

    // the range starts at the first used cell, not necessarily A1
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let grid = range
        .rows()
        .enumerate()
        .map(|(i, row)| (first_row + i + 1, row.iter().map(cell_value).collect()))
        .collect();

    Ok(grid)
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::String(s) => CellValue::text(s.clone()),
        DataType::Float(f) => CellValue::Number(*f),
        DataType::Int(v) => CellValue::Number(*v as f64),
        DataType::Bool(v) => CellValue::Text(v.to_string()),
        DataType::DateTime(serial) => CellValue::Text(excel_serial_to_string(*serial)),
        DataType::Error(_) => CellValue::Empty,
        other => CellValue::text(other.to_string()),
    }
}

/// Excel serial date (days since 1899-12-30) as `YYYY-MM-DD HH:MM:SS`.
pub fn excel_serial_to_string(serial: f64) -> String {
    let rendered = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|epoch| {
            let seconds = (serial * 86_400.0).round();
            if !seconds.is_finite() || seconds.abs() > 1e12 {
                return None;
            }
            epoch.checked_add_signed(Duration::seconds(seconds as i64))
        })
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string());

    rendered.unwrap_or_else(|| format_number(serial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExternalRefs;
    use crate::parser::{decode, FileKind};
    use crate::records::RecordKind;
    use crate::validation::validate;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    fn workbook_bytes(rows: &[&[&str]], start_row: u32) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(start_row + r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_magic_detection() {
        assert!(looks_like_workbook(b"PK\x03\x04rest"));
        assert!(looks_like_workbook(OLE_MAGIC));
        assert!(!looks_like_workbook(b"Name*,Description*"));
    }

    #[test]
    fn test_serial_date() {
        // 2024-01-15 10:00:00
        assert_eq!(excel_serial_to_string(45306.416666666664), "2024-01-15 10:00:00");
        assert_eq!(excel_serial_to_string(45306.0), "2024-01-15 00:00:00");
    }

    #[test]
    fn test_read_workbook_rows() {
        let bytes = workbook_bytes(
            &[
                &["Title*", "Location*"],
                &["Concert", "Main Hall"],
                &["", ""],
                &["Talk", "Room 2"],
            ],
            0,
        );
        let rows = decode(&bytes, FileKind::Xlsx).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].origin_row_number, 2);
        assert_eq!(rows[1].origin_row_number, 4);
        assert_eq!(rows[1].text("Location*"), "Room 2");
    }

    #[test]
    fn test_sheet_not_starting_at_a1() {
        let bytes = workbook_bytes(&[&["Title*"], &["Concert"]], 2);
        let rows = decode(&bytes, FileKind::Xlsx).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].origin_row_number, 4);
    }

    #[test]
    fn test_numeric_cells_kept() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Latitude*").unwrap();
        sheet.write_number(1, 0, 40.7128).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let rows = decode(&bytes, FileKind::Xlsx).unwrap();
        assert_eq!(rows[0].get("Latitude*"), Some(&CellValue::Number(40.7128)));
    }

    #[test]
    fn test_date_cells_validate_as_event_dates() {
        let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let start = ExcelDateTime::from_ymd(2024, 1, 15).unwrap().and_hms(10, 0, 0).unwrap();
        let end = ExcelDateTime::from_ymd(2024, 1, 15).unwrap().and_hms(12, 30, 0).unwrap();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let headers = ["Title*", "Description*", "Location*", "Start Date*", "End Date*"];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "Concert").unwrap();
        sheet.write_string(1, 1, "Strings").unwrap();
        sheet.write_string(1, 2, "Main Hall").unwrap();
        sheet.write_datetime_with_format(1, 3, &start, &date_format).unwrap();
        sheet.write_datetime_with_format(1, 4, &end, &date_format).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let rows = decode(&bytes, FileKind::Xlsx).unwrap();
        assert_eq!(rows[0].text("Start Date*"), "2024-01-15 10:00:00");
        assert_eq!(rows[0].text("End Date*"), "2024-01-15 12:30:00");
        assert!(validate(&rows, RecordKind::Event, &ExternalRefs::default()).is_empty());
    }

    #[test]
    fn test_garbage_workbook_is_decode_error() {
        let bytes = b"PK\x03\x04 definitely not a zip archive";
        assert!(matches!(
            decode(bytes, FileKind::Xlsx),
            Err(DecodeError::Workbook(_))
        ));
    }
}
