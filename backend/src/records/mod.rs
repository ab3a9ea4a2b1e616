//! Record kinds targeted by an import batch.
//!
//! [`RecordKind`] is the single place where behaviour differs between
//! places of interest and events: required headers, row rules, payload
//! mapping and template rows all dispatch from here.

pub mod event;
pub mod poi;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{ExternalRefs, RowMapping};
use crate::transform::Payload;
use crate::validation::{require, ValidationError};

/// Target entity type of an import batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Poi,
    Event,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Poi, RecordKind::Event];

    /// Headers whose trimmed value must be non-empty, in check order.
    pub fn required_headers(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Poi => &poi::REQUIRED,
            RecordKind::Event => &event::REQUIRED,
        }
    }

    /// Header holding the human identifier used in failure messages.
    pub fn identifier_header(&self) -> &'static str {
        match self {
            RecordKind::Poi => poi::NAME,
            RecordKind::Event => event::TITLE,
        }
    }

    /// Run every rule of this kind on one row.
    pub fn validate_row(&self, row: &RowMapping, refs: &ExternalRefs) -> Vec<ValidationError> {
        let mut errors = require(row, self.required_headers());
        errors.extend(match self {
            RecordKind::Poi => poi::check_values(row, refs),
            RecordKind::Event => event::check_values(row),
        });
        errors
    }

    /// Map a validated row to its create payload.
    pub fn to_payload(&self, row: &RowMapping, refs: &ExternalRefs) -> Result<Payload, ValidationError> {
        match self {
            RecordKind::Poi => poi::to_payload(row, refs).map(Payload::Poi),
            RecordKind::Event => event::to_payload(row).map(Payload::Event),
        }
    }

    /// Header row and one example row for the downloadable template.
    pub fn template_rows(&self) -> [&'static [&'static str]; 2] {
        match self {
            RecordKind::Poi => [&poi::TEMPLATE_HEADERS, &poi::TEMPLATE_EXAMPLE],
            RecordKind::Event => [&event::TEMPLATE_HEADERS, &event::TEMPLATE_EXAMPLE],
        }
    }

    /// Whether validation needs the category snapshot.
    pub fn needs_categories(&self) -> bool {
        matches!(self, RecordKind::Poi)
    }

    /// Lowercase slug used in URLs and file names.
    pub fn slug(&self) -> &'static str {
        match self {
            RecordKind::Poi => "poi",
            RecordKind::Event => "event",
        }
    }

    /// Plural label used in user-facing summaries.
    pub fn plural(&self) -> &'static str {
        match self {
            RecordKind::Poi => "POIs",
            RecordKind::Event => "events",
        }
    }

    /// Worksheet name of the template.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            RecordKind::Poi => "POIs",
            RecordKind::Event => "Events",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poi" | "pois" => Ok(RecordKind::Poi),
            "event" | "events" => Ok(RecordKind::Event),
            other => Err(format!("Unknown record kind '{}' (expected 'poi' or 'event')", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("poi".parse::<RecordKind>().unwrap(), RecordKind::Poi);
        assert_eq!("Events".parse::<RecordKind>().unwrap(), RecordKind::Event);
        assert!("venue".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_template_headers_match_required() {
        // the `*` markers must match the validator literally
        for kind in RecordKind::ALL {
            let [headers, example] = kind.template_rows();
            assert_eq!(headers.len(), example.len());
            for required in kind.required_headers() {
                assert!(headers.contains(required), "{} missing {}", kind, required);
            }
        }
    }
}
