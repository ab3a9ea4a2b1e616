//! # Vista - bulk import for the Vista Explorer portal
//!
//! Vista turns spreadsheets (Excel `.xlsx`/`.xls` or CSV) into points of
//! interest and events on the Vista Explorer REST backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ XLSX / CSV  │────▶│   Decoder   │────▶│  Validator  │────▶│  Importer   │
//! │   upload    │     │ (auto-enc)  │     │ (all rows)  │     │ (row by row)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Nothing is submitted while any row has a validation error. Once the gate
//! passes, rows are mapped and submitted one at a time; a failing row is
//! counted and the run continues.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vista::{decode_path, AppConfig, ApiClient, Importer, RecordKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let client = ApiClient::new(&config.api)?;
//!     let rows = decode_path("pois.xlsx")?;
//!     let refs = client.category_refs().await?;
//!     let result = Importer::new().run(&rows, RecordKind::Poi, &refs, &client).await?;
//!     println!("{} imported, {} failed", result.succeeded, result.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`config`] - Environment configuration
//! - [`models`] - Cells, rows, categories, import results
//! - [`parser`] - Spreadsheet and CSV decoding
//! - [`records`] - Per-kind headers, rules and templates
//! - [`validation`] - Pre-flight row validation
//! - [`transform`] - Row to API payload mapping
//! - [`import`] - Import orchestration
//! - [`template`] - Downloadable import templates
//! - [`client`] - REST client for the portal backend
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Decoding
pub mod parser;

// Record kinds
pub mod records;

// Validation
pub mod validation;

// Mapping
pub mod transform;

// Orchestration
pub mod import;

// Templates
pub mod template;

// Remote backend
pub mod client;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ApiError,
    ConfigError,
    DecodeError,
    ImportError,
    ServerError,
    TemplateError,
    UnsupportedFile,
};

// =============================================================================
// Re-exports - Config & Models
// =============================================================================

pub use config::AppConfig;

pub use models::{
    Category,
    CellValue,
    ExternalRefs,
    ImportResult,
    RowMapping,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use parser::{decode, decode_path, FileKind};
pub use records::RecordKind;
pub use validation::{validate, ValidationError};
pub use transform::{to_payload, EventPayload, Payload, PoiPayload};
pub use import::{ImportState, Importer, RecordSink};
pub use template::{emit_template, TemplateFormat};
pub use client::ApiClient;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
