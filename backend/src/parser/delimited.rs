//! CSV reading with encoding and delimiter auto-detection.

use crate::error::DecodeResult;
use crate::models::CellValue;

use super::GridRow;

/// Detect the encoding of raw bytes using chardet.
///
/// Valid UTF-8 short-circuits detection: chardet guesses poorly on short
/// ASCII-heavy inputs.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding. Unknown labels fall
/// back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        // WHATWG maps the latin-1 labels to windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(codec) => codec.decode(bytes).0.into_owned(),
            None => {
                tracing::warn!(encoding = other, "unknown encoding, decoding as lossy UTF-8");
                String::from_utf8_lossy(bytes).into_owned()
            }
        },
    }
}

/// Detect the delimiter by counting occurrences in the header line.
/// Comma wins ties.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read CSV bytes into a grid of text cells.
pub fn read_grid(bytes: &[u8]) -> DecodeResult<Vec<GridRow>> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = detect_delimiter(content);

    tracing::debug!(%encoding, delimiter = %delimiter.escape_default(), "reading CSV");

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    let mut record = ::csv::StringRecord::new();
    let mut row = 0usize;
    let mut consumed = 0usize;

    // Row numbers count records, not text lines: a quoted cell spanning
    // several lines is still one row. Empty lines skipped by the reader
    // still occupy a row.
    while reader.read_record(&mut record)? {
        row += 1 + blank_lines_at(content, consumed);
        consumed = reader.position().byte() as usize;

        let cells = record.iter().map(CellValue::text).collect();
        grid.push((row, cells));
    }

    Ok(grid)
}

/// Number of empty lines starting at byte `from`, which sits right after a
/// record terminator.
fn blank_lines_at(content: &str, from: usize) -> usize {
    let bytes = content.as_bytes();
    let mut from = from.min(bytes.len());

    // second half of a CRLF terminator
    if from > 0 && bytes[from - 1] == b'\r' && bytes.get(from) == Some(&b'\n') {
        from += 1;
    }

    let run = bytes[from..]
        .iter()
        .take_while(|&&b| matches!(b, b'\r' | b'\n'))
        .count();
    content[from..from + run].replace("\r\n", "\n").len()
}
