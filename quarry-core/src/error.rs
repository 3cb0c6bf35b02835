//! Error types for the Quarry console core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering metaquery dispatch, catalog loading, and configuration.

use std::path::PathBuf;

/// Top-level error type for the Quarry core library.
#[derive(Debug, thiserror::Error)]
pub enum QuarryError {
    #[error("Metaquery error: {0}")]
    Metaquery(#[from] MetaqueryError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while validating or executing a dot-command.
///
/// Every variant is recoverable at the dispatch boundary: the REPL prints
/// it and reads the next line.
#[derive(Debug, thiserror::Error)]
pub enum MetaqueryError {
    #[error("'{command}' is not a known command{}", did_you_mean(.suggestion))]
    UnknownCommand {
        command: String,
        suggestion: Option<String>,
    },

    #[error("not sure how to handle '{command}'")]
    Unhandled { command: String },

    #[error("command does not accept any arguments - got {actual}")]
    NoArguments { actual: usize },

    #[error("command needs {expected} argument(s) - got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("command needs at most {max} argument(s) - got {actual}")]
    TooManyArguments { max: usize, actual: usize },

    #[error("invalid value '{value}', valid values for this command are: {allowed}")]
    InvalidValue { value: String, allowed: String },

    #[error("invalid output format '{value}', valid formats are: {allowed}")]
    InvalidOutputFormat { value: String, allowed: String },

    #[error("invalid search pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("connection '{name}' not found")]
    ConnectionNotFound { name: String },

    #[error("table '{table}' not found in connection '{connection}'")]
    TableNotFound { connection: String, table: String },

    #[error("command '{keyword}' is registered more than once")]
    DuplicateCommand { keyword: String },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" - did you mean '{s}'?"),
        None => String::new(),
    }
}

/// Errors from loading a catalog snapshot.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to parse catalog file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported catalog file format: {path} (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

impl From<Box<figment::Error>> for ConfigError {
    fn from(err: Box<figment::Error>) -> Self {
        ConfigError::ParseError {
            message: err.to_string(),
        }
    }
}

/// Convenience type alias for Quarry results.
pub type Result<T> = std::result::Result<T, QuarryError>;
