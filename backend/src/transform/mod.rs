//! Payload mapping: validated rows -> create-endpoint payloads.
//!
//! Only ever called on rows that passed validation. The per-kind mapping
//! re-derives what it needs (category id, coordinates, dates) and reports a
//! [`ValidationError`] instead of panicking if that precondition was broken.

use serde::Serialize;

use crate::models::{ExternalRefs, RowMapping};
use crate::records::RecordKind;
use crate::validation::ValidationError;

/// Body of `POST /pois`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoiPayload {
    pub name: String,
    pub description: String,
    pub category_id: i64,
    /// Serialized `{"lat":..,"lng":..}` object.
    pub location: String,
    pub image_urls: Vec<String>,
}

/// Body of `POST /events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub image_url: Option<String>,
}

impl PoiPayload {
    /// Multipart fields of `POST /pois`; one `image_urls[i]` per URL.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("name".to_string(), self.name.clone()),
            ("description".to_string(), self.description.clone()),
            ("category_id".to_string(), self.category_id.to_string()),
            ("location".to_string(), self.location.clone()),
        ];
        fields.extend(
            self.image_urls
                .iter()
                .enumerate()
                .map(|(i, url)| (format!("image_urls[{}]", i), url.clone())),
        );
        fields
    }
}

impl EventPayload {
    /// Multipart fields of `POST /events`; `image_url` only when present.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("title".to_string(), self.title.clone()),
            ("description".to_string(), self.description.clone()),
            ("location".to_string(), self.location.clone()),
            ("start_date".to_string(), self.start_date.clone()),
            ("end_date".to_string(), self.end_date.clone()),
        ];
        if let Some(url) = &self.image_url {
            fields.push(("image_url".to_string(), url.clone()));
        }
        fields
    }
}

/// Payload of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Poi(PoiPayload),
    Event(EventPayload),
}

impl Payload {
    /// Name of a POI, title of an event.
    pub fn identifier(&self) -> &str {
        match self {
            Payload::Poi(p) => &p.name,
            Payload::Event(e) => &e.title,
        }
    }
}

/// Map one validated row to the payload for `kind`.
pub fn to_payload(row: &RowMapping, kind: RecordKind, refs: &ExternalRefs) -> Result<Payload, ValidationError> {
    kind.to_payload(row, refs)
}
