//! Shared types, error model, and configuration for confluence-bridge.
//!
//! This crate is the foundation depended on by all other bridge crates.
//! It provides:
//! - [`BridgeError`], the unified error type
//! - Domain types ([`Document`], [`Table`], [`SearchResult`], [`Outcome`])
//! - Configuration ([`AppConfig`], [`ConnectionConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthConfig, ConfluenceConfig, ConnectionConfig, URL_ENV, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{BridgeError, Result};
pub use types::{
    Document, DocumentBody, DocumentSummary, ErrorPayload, Outcome, Row, SearchResult, SpaceRef,
    Table, VersionInfo, detail_text,
};
