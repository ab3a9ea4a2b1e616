//! HTTP API module.
//!
//! This module provides the HTTP server, wire types and progress log stream
//! for the import pipeline.

pub mod server;
pub mod types;
pub mod logs;

pub use server::{router, start_server, AppState};
pub use types::*;
pub use logs::*;
