//! Event rows and date-time handling.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::RowMapping;
use crate::transform::EventPayload;
use crate::validation::{present, ValidationError};

pub const TITLE: &str = "Title*";
pub const DESCRIPTION: &str = "Description*";
pub const LOCATION: &str = "Location*";
pub const START_DATE: &str = "Start Date*";
pub const END_DATE: &str = "End Date*";
pub const IMAGE_URL: &str = "Image URL";

pub const REQUIRED: [&str; 5] = [TITLE, DESCRIPTION, LOCATION, START_DATE, END_DATE];

pub const TEMPLATE_HEADERS: [&str; 6] = [TITLE, DESCRIPTION, LOCATION, START_DATE, END_DATE, IMAGE_URL];

pub const TEMPLATE_EXAMPLE: [&str; 6] = [
    "Sample Event",
    "A sample event description",
    "Main Hall",
    "2024-01-15 10:00:00",
    "2024-01-15 12:00:00",
    "https://example.com/event.jpg",
];

const START_ERROR: &str = "Invalid start date format. Use YYYY-MM-DD HH:mm:ss";
const END_ERROR: &str = "Invalid end date format. Use YYYY-MM-DD HH:mm:ss";
const ORDER_ERROR: &str = "End date must be after start date";

/// Naive date-time layouts accepted besides RFC 3339.
const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date parse and ordering rules. Blank fields are left to the required check.
pub fn check_values(row: &RowMapping) -> Vec<ValidationError> {
    let n = row.origin_row_number;
    let mut errors = Vec::new();

    let start = present(row, START_DATE).then(|| parse_datetime(&row.text(START_DATE)));
    let end = present(row, END_DATE).then(|| parse_datetime(&row.text(END_DATE)));

    if let Some(None) = start {
        errors.push(ValidationError::new(n, START_ERROR));
    }
    if let Some(None) = end {
        errors.push(ValidationError::new(n, END_ERROR));
    }
    if let (Some(Some(start)), Some(Some(end))) = (start, end) {
        if start >= end {
            errors.push(ValidationError::new(n, ORDER_ERROR));
        }
    }

    errors
}

pub fn to_payload(row: &RowMapping) -> Result<EventPayload, ValidationError> {
    let n = row.origin_row_number;
    let start = parse_datetime(&row.text(START_DATE)).ok_or_else(|| ValidationError::new(n, START_ERROR))?;
    let end = parse_datetime(&row.text(END_DATE)).ok_or_else(|| ValidationError::new(n, END_ERROR))?;

    let image_url = row.trimmed(IMAGE_URL);

    Ok(EventPayload {
        title: row.trimmed(TITLE),
        description: row.trimmed(DESCRIPTION),
        location: row.trimmed(LOCATION),
        start_date: canonical_timestamp(&start),
        end_date: canonical_timestamp(&end),
        image_url: (!image_url.is_empty()).then_some(image_url),
    })
}

/// Parse a date-time cell. Values without an offset are taken as UTC; a
/// bare date means midnight.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn canonical_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
