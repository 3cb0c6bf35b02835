//! Typed session options mutated by the toggle commands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::SessionConfig;

/// Result display format for query output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn all() -> &'static [OutputFormat] {
        &[OutputFormat::Table, OutputFormat::Csv, OutputFormat::Json]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    /// Comma-separated list of every format name, for error messages.
    pub fn allowed_list() -> String {
        Self::all()
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

/// Display and input options for one interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub output: OutputFormat,
    pub header: bool,
    pub timing: bool,
    pub multiline: bool,
    pub autocomplete: bool,
    pub separator: String,
    /// Overrides the catalog's search path for unqualified table lookups.
    pub search_path: Option<Vec<String>>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            output: config.output,
            header: config.header,
            timing: config.timing,
            multiline: config.multiline,
            autocomplete: config.autocomplete,
            separator: config.separator.clone(),
            search_path: None,
        }
    }
}

impl SessionOptions {
    /// The search path in effect: the session override if set, else the catalog's.
    pub fn effective_search_path<'a>(&'a self, catalog_path: &'a [String]) -> &'a [String] {
        self.search_path.as_deref().unwrap_or(catalog_path)
    }
}
