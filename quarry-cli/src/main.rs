//! Quarry CLI: interactive SQL console with dot-command metaqueries.
//!
//! Runs an interactive REPL, or a batch of lines given with `--command`.

mod render;
mod repl;
mod repl_input;

use clap::Parser;
use quarry_core::catalog::load_catalog;
use quarry_core::config::{QuarryConfig, load_config_file};
use quarry_core::{Catalog, CatalogSnapshot, Interpreter, SessionOptions, SharedCatalog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Quarry: an interactive SQL console
#[derive(Parser, Debug)]
#[command(name = "quarry", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path (replaces the user and workspace config files)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog snapshot file (.json or .toml)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Run a line non-interactively; may be repeated
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "quarry", "quarry")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "quarry.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    // Load configuration
    let config = match &cli.config {
        Some(path) => load_config_file(path),
        None => {
            if !quarry_core::config_exists(Some(&workspace)) {
                tracing::debug!("No configuration file found, using defaults");
            }
            quarry_core::load_config(Some(&workspace), None)
        }
    }
    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    for warning in config.validate() {
        eprintln!("\x1b[33mConfig warning:\x1b[0m {warning}");
    }

    let catalog_path = cli
        .catalog
        .clone()
        .or_else(|| config.catalog.path.clone())
        .map(|p| resolve(&workspace, p));
    let catalog = build_catalog(&config, catalog_path.as_deref())?;

    let shared = Arc::new(SharedCatalog::new(CatalogSnapshot::new(
        catalog,
        config.connection_directory(),
    )));
    let interpreter = Interpreter::with_defaults(shared);
    let mut session = repl::Repl::new(
        interpreter,
        Box::new(repl::DetachedEngine),
        SessionOptions::from(&config.session),
    );

    if !cli.command.is_empty() {
        return repl::run_batch(&mut session, &cli.command);
    }

    let history_file = config
        .history
        .enabled
        .then(|| resolve(&workspace, config.history.file.clone()));
    let history = repl_input::InputHistory::new(history_file, config.history.max_entries);
    let mut input = repl_input::ReplInput::new(history);
    repl::run_interactive(&mut session, &mut input)
}

/// Load the catalog snapshot, filling unset fields from the config.
fn build_catalog(config: &QuarryConfig, path: Option<&Path>) -> anyhow::Result<Catalog> {
    let mut catalog = match path {
        Some(path) => load_catalog(path)?,
        None => {
            tracing::debug!("No catalog configured, starting with an empty catalog");
            Catalog::new()
        }
    };
    if catalog.search_path.is_empty() {
        catalog.search_path = config.catalog.search_path.clone();
    }
    if catalog.temporary_schema.is_empty() {
        catalog.temporary_schema = config.catalog.temporary_schema.clone();
    }
    Ok(catalog)
}

fn resolve(workspace: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        workspace.join(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_collects_repeated_commands() {
        let cli = Cli::try_parse_from(["quarry", "-c", ".tables", "--command", ".exit"]).unwrap();
        assert_eq!(cli.command, vec![".tables", ".exit"]);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_build_catalog_falls_back_to_config_search_path() {
        let mut config = QuarryConfig::default();
        config.catalog.search_path = vec!["aws".into()];
        config.catalog.temporary_schema = "pg_temp".into();
        let catalog = build_catalog(&config, None).unwrap();
        assert_eq!(catalog.search_path, vec!["aws"]);
        assert_eq!(catalog.temporary_schema, "pg_temp");
    }

    #[test]
    fn test_build_catalog_keeps_snapshot_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"connections": {"gcp": {}}, "search_path": ["gcp"]}"#).unwrap();
        let mut config = QuarryConfig::default();
        config.catalog.search_path = vec!["aws".into()];
        let catalog = build_catalog(&config, Some(&path)).unwrap();
        assert_eq!(catalog.search_path, vec!["gcp"]);
        assert!(catalog.connections.contains_key("gcp"));
    }

    #[test]
    fn test_resolve_relative_paths_against_workspace() {
        let ws = Path::new("/work");
        assert_eq!(
            resolve(ws, PathBuf::from(".quarry/history")),
            PathBuf::from("/work/.quarry/history")
        );
        assert_eq!(resolve(ws, PathBuf::from("/tmp/h")), PathBuf::from("/tmp/h"));
    }
}
