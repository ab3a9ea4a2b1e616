//! Place-of-interest rows.

use serde_json::json;

use crate::models::{ExternalRefs, RowMapping};
use crate::transform::PoiPayload;
use crate::validation::{present, ValidationError};

pub const NAME: &str = "Name*";
pub const DESCRIPTION: &str = "Description*";
pub const CATEGORY: &str = "Category*";
pub const LATITUDE: &str = "Latitude*";
pub const LONGITUDE: &str = "Longitude*";
pub const IMAGE_URLS: &str = "Image URLs (comma separated)";

pub const REQUIRED: [&str; 5] = [NAME, DESCRIPTION, CATEGORY, LATITUDE, LONGITUDE];

pub const TEMPLATE_HEADERS: [&str; 6] = [NAME, DESCRIPTION, CATEGORY, LATITUDE, LONGITUDE, IMAGE_URLS];

pub const TEMPLATE_EXAMPLE: [&str; 6] = [
    "Example POI",
    "A sample place of interest",
    "Library",
    "40.7128",
    "-74.0060",
    "https://example.com/image1.jpg,https://example.com/image2.jpg",
];

const LATITUDE_ERROR: &str = "Invalid latitude. Must be between -90 and 90";
const LONGITUDE_ERROR: &str = "Invalid longitude. Must be between -180 and 180";

/// Category and coordinate rules. Blank fields are left to the required check.
pub fn check_values(row: &RowMapping, refs: &ExternalRefs) -> Vec<ValidationError> {
    let n = row.origin_row_number;
    let mut errors = Vec::new();

    if present(row, CATEGORY) && refs.find_category(&row.text(CATEGORY)).is_none() {
        errors.push(category_error(row, refs));
    }

    if present(row, LATITUDE) && coordinate(row, LATITUDE, 90.0).is_none() {
        errors.push(ValidationError::new(n, LATITUDE_ERROR));
    }

    if present(row, LONGITUDE) && coordinate(row, LONGITUDE, 180.0).is_none() {
        errors.push(ValidationError::new(n, LONGITUDE_ERROR));
    }

    errors
}

pub fn to_payload(row: &RowMapping, refs: &ExternalRefs) -> Result<PoiPayload, ValidationError> {
    let n = row.origin_row_number;

    let category = refs
        .find_category(&row.text(CATEGORY))
        .ok_or_else(|| category_error(row, refs))?;
    let lat = coordinate(row, LATITUDE, 90.0).ok_or_else(|| ValidationError::new(n, LATITUDE_ERROR))?;
    let lng = coordinate(row, LONGITUDE, 180.0).ok_or_else(|| ValidationError::new(n, LONGITUDE_ERROR))?;

    Ok(PoiPayload {
        name: row.trimmed(NAME),
        description: row.trimmed(DESCRIPTION),
        category_id: category.id,
        location: json!({ "lat": lat, "lng": lng }).to_string(),
        image_urls: split_urls(&row.text(IMAGE_URLS)),
    })
}

/// Numeric value within `[-limit, limit]`.
fn coordinate(row: &RowMapping, field: &str, limit: f64) -> Option<f64> {
    row.get(field)
        .and_then(|cell| cell.as_number())
        .filter(|v| (-limit..=limit).contains(v))
}

fn category_error(row: &RowMapping, refs: &ExternalRefs) -> ValidationError {
    ValidationError::new(
        row.origin_row_number,
        format!(
            "Category \"{}\" not found. Available: {}",
            row.text(CATEGORY),
            refs.category_names().join(", ")
        ),
    )
}

/// Comma-delimited cell -> trimmed, non-empty URLs.
pub fn split_urls(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CellValue};

    fn refs() -> ExternalRefs {
        ExternalRefs::new(vec![Category { id: 7, name: "Library".into() }])
    }

    fn row() -> RowMapping {
        TEMPLATE_HEADERS
            .iter()
            .zip(TEMPLATE_EXAMPLE.iter())
            .fold(RowMapping::new(2), |row, (h, v)| row.with(*h, CellValue::text(*v)))
    }

    #[test]
    fn test_template_example_is_valid() {
        assert!(check_values(&row(), &refs()).is_empty());
    }

    #[test]
    fn test_payload_shape() {
        let payload = to_payload(&row(), &refs()).unwrap();

        assert_eq!(payload.name, "Example POI");
        assert_eq!(payload.category_id, 7);
        assert_eq!(payload.location, r#"{"lat":40.7128,"lng":-74.006}"#);
        assert_eq!(
            payload.image_urls,
            vec!["https://example.com/image1.jpg", "https://example.com/image2.jpg"]
        );
    }

    #[test]
    fn test_category_resolved_case_insensitively() {
        let row = row().with(CATEGORY, CellValue::text("library"));
        assert_eq!(to_payload(&row, &refs()).unwrap().category_id, 7);
    }

    #[test]
    fn test_no_images() {
        let row = row().with(IMAGE_URLS, CellValue::Empty);
        assert!(to_payload(&row, &refs()).unwrap().image_urls.is_empty());
    }

    #[test]
    fn test_split_urls_drops_blanks() {
        assert_eq!(split_urls(" a.jpg , ,b.jpg,"), vec!["a.jpg", "b.jpg"]);
        assert!(split_urls("").is_empty());
    }

    #[test]
    fn test_unresolved_category_is_not_mapped() {
        let row = row().with(CATEGORY, CellValue::text("Stadium"));
        let err = to_payload(&row, &refs()).unwrap_err();
        assert!(err.message.starts_with("Category \"Stadium\" not found"));
    }
}
