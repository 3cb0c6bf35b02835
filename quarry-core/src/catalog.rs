//! Read-only schema catalog: connections, tables, and columns.
//!
//! The catalog is a snapshot. Handlers only ever read it; the reload
//! collaborator swaps in a whole new snapshot through [`SharedCatalog::replace`]
//! and every dispatcher call picks up whatever snapshot is current when it starts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::error::CatalogError;

/// Metadata for a single column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    #[serde(default)]
    pub name: String,
    /// Declared type as reported by the engine, e.g. "text" or "jsonb".
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub description: String,
}

/// Metadata for a single table and its columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnInfo>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Add a column, keyed by its name.
    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        self.columns.insert(column.name.clone(), column);
        self
    }
}

/// Tables of one connection, keyed by table name.
pub type TableSet = BTreeMap<String, TableInfo>;

/// The schema catalog: connection name -> tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub connections: BTreeMap<String, TableSet>,
    #[serde(default)]
    pub search_path: Vec<String>,
    /// Name of the engine's temporary schema; empty when there is none.
    #[serde(default)]
    pub temporary_schema: String,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table under a connection, creating the connection if needed.
    pub fn insert_table(&mut self, connection: &str, table: TableInfo) {
        self.connections
            .entry(connection.to_string())
            .or_default()
            .insert(table.name.clone(), table);
    }

    pub fn connection(&self, name: &str) -> Option<&TableSet> {
        self.connections.get(name)
    }

    pub fn table(&self, connection: &str, table: &str) -> Option<&TableInfo> {
        self.connections.get(connection)?.get(table)
    }

    /// Find an unqualified table name by walking `search_path` in order.
    ///
    /// Returns the connection the table was found in along with the table.
    pub fn find_in_search_path<'a>(
        &'a self,
        table: &str,
        search_path: &'a [String],
    ) -> Option<(&'a str, &'a TableInfo)> {
        search_path.iter().find_map(|connection| {
            self.table(connection, table)
                .map(|info| (connection.as_str(), info))
        })
    }

    /// Connection names excluding the temporary schema, in name order.
    pub fn connection_names(&self) -> impl Iterator<Item = &str> {
        self.connections
            .keys()
            .map(String::as_str)
            .filter(|name| self.temporary_schema.is_empty() || *name != self.temporary_schema)
    }
}

/// Plugin identity for a configured connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    #[serde(default)]
    pub plugin: String,
}

impl PluginInfo {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
        }
    }
}

/// Connection name -> plugin identity, supplied by the connection configuration.
///
/// A catalog connection without an entry here is valid and renders with an
/// empty plugin label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionDirectory(BTreeMap<String, PluginInfo>);

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, connection: impl Into<String>, info: PluginInfo) {
        self.0.insert(connection.into(), info);
    }

    pub fn get(&self, connection: &str) -> Option<&PluginInfo> {
        self.0.get(connection)
    }

    /// Plugin label for a connection, or "" when it is not configured.
    pub fn plugin_label(&self, connection: &str) -> &str {
        self.get(connection).map(|p| p.plugin.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, PluginInfo)> for ConnectionDirectory {
    fn from_iter<I: IntoIterator<Item = (String, PluginInfo)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One catalog together with the connection directory it was built against.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub catalog: Catalog,
    pub connections: ConnectionDirectory,
}

impl CatalogSnapshot {
    pub fn new(catalog: Catalog, connections: ConnectionDirectory) -> Self {
        Self {
            catalog,
            connections,
        }
    }
}

/// Source of the current catalog snapshot.
pub trait CatalogProvider: Send + Sync {
    /// The snapshot current at the time of the call.
    fn snapshot(&self) -> Arc<CatalogSnapshot>;
}

/// A catalog provider whose snapshot can be replaced between commands.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl SharedCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Swap in a new snapshot. Calls already in flight keep the old one.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        let connections = snapshot.catalog.connections.len();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(snapshot);
        tracing::info!(connections, "Catalog snapshot replaced");
    }
}

impl CatalogProvider for SharedCatalog {
    fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Load a catalog from a `.json` or `.toml` snapshot file.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let parse_err = |message: String| CatalogError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut catalog: Catalog = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        _ => {
            return Err(CatalogError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    catalog.normalize_names();
    tracing::debug!(
        path = %path.display(),
        connections = catalog.connections.len(),
        "Loaded catalog snapshot"
    );
    Ok(catalog)
}

impl Catalog {
    /// Fill in table and column names from their map keys when a snapshot
    /// file leaves them out.
    fn normalize_names(&mut self) {
        for tables in self.connections.values_mut() {
            for (table_name, table) in tables.iter_mut() {
                if table.name.is_empty() {
                    table.name = table_name.clone();
                }
                for (column_name, column) in table.columns.iter_mut() {
                    if column.name.is_empty() {
                        column.name = column_name.clone();
                    }
                }
            }
        }
    }
}
