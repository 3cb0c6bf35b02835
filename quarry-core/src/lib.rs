//! # Quarry Core
//!
//! Core library for the Quarry SQL console.
//! Provides the schema catalog, the dot-command interpreter (validation,
//! dispatch, handlers, completion), typed session options, and configuration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod metaquery;
pub mod options;

// Re-export commonly used types at the crate root.
pub use catalog::{
    Catalog, CatalogProvider, CatalogSnapshot, ColumnInfo, ConnectionDirectory, PluginInfo,
    SharedCatalog, TableInfo, TableSet,
};
pub use config::{QuarryConfig, config_exists, load_config};
pub use error::{MetaqueryError, QuarryError, Result};
pub use metaquery::{Interpreter, Session, SessionControl, Suggestion, ValidationResult};
pub use options::{OutputFormat, SessionOptions};
