//! Configuration system for Quarry.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/quarry/config.toml` and/or `.quarry/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog::{ConnectionDirectory, PluginInfo};
use crate::options::OutputFormat;

/// Top-level configuration for the Quarry console.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuarryConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Configured connections; the source of the connection directory.
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Initial values for the session options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub output: OutputFormat,
    #[serde(default = "default_true")]
    pub header: bool,
    #[serde(default)]
    pub timing: bool,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default = "default_true")]
    pub autocomplete: bool,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output: OutputFormat::Table,
            header: true,
            timing: false,
            multiline: false,
            autocomplete: true,
            separator: default_separator(),
        }
    }
}

/// Where the catalog snapshot comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to a `.json` or `.toml` catalog snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Used when the snapshot does not carry its own search path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_path: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub temporary_schema: String,
}

/// A configured connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Plugin label, e.g. "aws" or "hub.example.com/plugins/aws@latest".
    #[serde(default)]
    pub plugin: String,
}

/// REPL input history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_history")]
    pub max_entries: usize,
    /// History file; relative paths resolve against the workspace.
    #[serde(default = "default_history_file")]
    pub file: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_history(),
            file: default_history_file(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_separator() -> String {
    ",".to_string()
}

fn default_max_history() -> usize {
    500
}

fn default_history_file() -> PathBuf {
    PathBuf::from(".quarry").join("history")
}

impl QuarryConfig {
    /// Build the connection directory from the `[connections]` table.
    pub fn connection_directory(&self) -> ConnectionDirectory {
        self.connections
            .iter()
            .map(|(name, conn)| (name.clone(), PluginInfo::new(conn.plugin.clone())))
            .collect()
    }

    /// Return a list of configuration warnings. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.session.separator.is_empty() {
            warnings.push("session.separator is empty; csv output will be unreadable".into());
        }
        if self.history.enabled && self.history.max_entries == 0 {
            warnings.push("history.max_entries is 0; no history will be kept".into());
        }
        for (name, conn) in &self.connections {
            if conn.plugin.is_empty() {
                warnings.push(format!("connection '{name}' has no plugin configured"));
            }
        }
        warnings
    }
}

/// Load configuration from the standard locations.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&QuarryConfig>,
) -> Result<QuarryConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(QuarryConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "quarry", "quarry") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".quarry").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (QUARRY_SESSION__OUTPUT, QUARRY_CATALOG__PATH, etc.)
    figment = figment.merge(Env::prefixed("QUARRY_").split("__"));

    // Explicit overrides
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Load configuration from a single explicit file layered over the defaults.
pub fn load_config_file(path: &Path) -> Result<QuarryConfig, Box<figment::Error>> {
    Figment::from(Serialized::defaults(QuarryConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("QUARRY_").split("__"))
        .extract()
        .map_err(Box::new)
}

/// Check whether any Quarry configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "quarry", "quarry")
        && config_dir.config_dir().join("config.toml").exists()
    {
        return true;
    }

    if let Some(ws) = workspace
        && ws.join(".quarry").join("config.toml").exists()
    {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QuarryConfig::default();
        assert_eq!(config.session.output, OutputFormat::Table);
        assert!(config.session.header);
        assert!(!config.session.timing);
        assert_eq!(config.session.separator, ",");
        assert!(config.catalog.path.is_none());
        assert!(config.connections.is_empty());
        assert_eq!(config.history.max_entries, 500);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".quarry");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            r#"
[session]
output = "json"
timing = true

[catalog]
path = "catalog.json"

[connections.aws]
plugin = "aws"

[connections.gcp]
plugin = "gcp"
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.session.output, OutputFormat::Json);
        assert!(config.session.timing);
        // Fields absent from the file keep their defaults.
        assert!(config.session.header);
        assert_eq!(config.catalog.path, Some(PathBuf::from("catalog.json")));

        let directory = config.connection_directory();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.plugin_label("gcp"), "gcp");
    }

    #[test]
    fn test_load_config_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = QuarryConfig::default();
        overrides.session.separator = "|".into();
        let config = load_config(Some(dir.path()), Some(&overrides)).unwrap();
        assert_eq!(config.session.separator, "|");
    }

    #[test]
    fn test_load_config_file_rejects_bad_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarry.toml");
        std::fs::write(&path, "[session]\noutput = \"yaml\"\n").unwrap();
        assert!(load_config_file(&path).is_err());
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut config = QuarryConfig::default();
        config.session.separator.clear();
        config.history.max_entries = 0;
        config
            .connections
            .insert("aws".into(), ConnectionConfig::default());
        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("'aws'")));
    }
}
