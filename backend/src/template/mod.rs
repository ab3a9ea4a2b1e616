//! Downloadable import templates: the header row plus one example row.

use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TemplateError;
use crate::records::RecordKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    #[default]
    Xlsx,
    Csv,
}

impl TemplateFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TemplateFormat::Xlsx => "xlsx",
            TemplateFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            TemplateFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            TemplateFormat::Csv => "text/csv",
        }
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TemplateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(TemplateFormat::Xlsx),
            "csv" => Ok(TemplateFormat::Csv),
            other => Err(format!("Unknown template format '{}' (expected 'xlsx' or 'csv')", other)),
        }
    }
}

/// `{poi|event}_import_template.{xlsx|csv}`
pub fn file_name(kind: RecordKind, format: TemplateFormat) -> String {
    format!("{}_import_template.{}", kind.slug(), format.extension())
}

/// Template bytes for `kind` in `format`.
pub fn emit_template(kind: RecordKind, format: TemplateFormat) -> Result<Vec<u8>, TemplateError> {
    match format {
        TemplateFormat::Xlsx => emit_workbook(kind),
        TemplateFormat::Csv => emit_csv(kind),
    }
}

fn emit_workbook(kind: RecordKind) -> Result<Vec<u8>, TemplateError> {
    let [headers, example] = kind.template_rows();
    let bold = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(kind.sheet_name())?;

    for (col, header) in headers.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *header, &bold)?;
        sheet.write_string(1, col, example[col as usize])?;
        sheet.set_column_width(col, (header.len().max(example[col as usize].len()) + 2).min(60) as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn emit_csv(kind: RecordKind) -> Result<Vec<u8>, TemplateError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in kind.template_rows() {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| TemplateError::Io(e.into_error()))
}
