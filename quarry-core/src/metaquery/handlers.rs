//! Per-command handlers.
//!
//! Handlers run only after their validator accepted the arguments, so they
//! trust argument counts. They read the catalog snapshot, mutate session
//! options, or write to the console and renderer; nothing else.

use regex::Regex;

use super::registry::Registry;
use super::session::{Session, SessionControl};
use crate::catalog::{Catalog, ConnectionDirectory, TableInfo};
use crate::error::MetaqueryError;
use crate::options::OutputFormat;

const TABLES_HINT: &str =
    "To get information about the tables in a connection, run .inspect {connection}";
const COLUMNS_HINT: &str =
    "To get information about the columns in a table, run .inspect {connection}.{table}";

/// Marks the `.tables` argument as a search pattern rather than a connection name.
const WILDCARD: char = '*';

/// Read-only inputs for one handler call.
pub struct HandlerInput<'a> {
    /// Whitespace-separated arguments after the keyword.
    pub args: Vec<&'a str>,
    pub catalog: &'a Catalog,
    pub connections: &'a ConnectionDirectory,
    pub registry: &'a Registry,
}

type HandlerResult = Result<SessionControl, MetaqueryError>;

pub fn help(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    session
        .renderer
        .render(&["Command", "Description"], &input.registry.help_rows(), false)?;
    Ok(SessionControl::Continue)
}

pub fn list_connections(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    let mut rows: Vec<Vec<String>> = input
        .catalog
        .connection_names()
        .map(|name| {
            vec![
                name.to_string(),
                input.connections.plugin_label(name).to_string(),
            ]
        })
        .collect();
    sort_by_first_column(&mut rows);

    session.renderer.render(&["Connection", "Plugin"], &rows, false)?;
    session.console.write_line("")?;
    session.console.write_line(TABLES_HINT)?;
    session.console.write_line(COLUMNS_HINT)?;
    Ok(SessionControl::Continue)
}

pub fn list_tables(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    match input.args.first() {
        None => {
            for connection in input.catalog.connection_names() {
                session.console.write_line("")?;
                session.console.write_line(&format!(" ==> {connection}"))?;
                describe_connection(input.catalog, connection, session)?;
            }
        }
        Some(pattern) if pattern.ends_with(WILDCARD) => {
            search_tables(input.catalog, pattern, session)?;
        }
        Some(connection) => describe_connection(input.catalog, connection, session)?,
    }
    Ok(SessionControl::Continue)
}

pub fn inspect(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    let Some(target) = input.args.first().copied() else {
        return list_connections(input, session);
    };

    if let Some((connection, table)) = target.split_once('.') {
        let tables = input.catalog.connection(connection).ok_or_else(|| {
            tracing::warn!(connection, "Inspect: connection not found");
            MetaqueryError::ConnectionNotFound {
                name: connection.to_string(),
            }
        })?;
        let info = tables
            .get(table)
            .ok_or_else(|| MetaqueryError::TableNotFound {
                connection: connection.to_string(),
                table: table.to_string(),
            })?;
        describe_table(info, session)?;
        return Ok(SessionControl::Continue);
    }

    if input.catalog.connection(target).is_some() {
        describe_connection(input.catalog, target, session)?;
        session.console.write_line("")?;
        session.console.write_line(COLUMNS_HINT)?;
        return Ok(SessionControl::Continue);
    }

    // Not a connection: try it as an unqualified table name.
    let search_path = session
        .options
        .effective_search_path(&input.catalog.search_path)
        .to_vec();
    match input.catalog.find_in_search_path(target, &search_path) {
        Some((connection, info)) => {
            tracing::debug!(table = target, connection, "Inspect resolved via search path");
            describe_table(info, session)?;
            Ok(SessionControl::Continue)
        }
        None => {
            tracing::warn!(target, "Inspect: no connection or table with this name");
            Err(MetaqueryError::ConnectionNotFound {
                name: target.to_string(),
            })
        }
    }
}

pub fn set_header(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    session.options.header = parse_toggle(&input.args);
    Ok(SessionControl::Continue)
}

pub fn set_timing(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    session.options.timing = parse_toggle(&input.args);
    Ok(SessionControl::Continue)
}

pub fn set_multiline(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    session.options.multiline = parse_toggle(&input.args);
    Ok(SessionControl::Continue)
}

pub fn set_autocomplete(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    session.options.autocomplete = parse_toggle(&input.args);
    Ok(SessionControl::Continue)
}

pub fn set_separator(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    if let Some(separator) = input.args.first() {
        session.options.separator = separator.to_string();
    }
    Ok(SessionControl::Continue)
}

pub fn set_output(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    if let Some(value) = input.args.first() {
        let format = value
            .parse::<OutputFormat>()
            .map_err(|value| MetaqueryError::InvalidOutputFormat {
                value,
                allowed: OutputFormat::allowed_list(),
            })?;
        session.options.output = format;
    }
    Ok(SessionControl::Continue)
}

pub fn search_path(input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    if let Some(arg) = input.args.first() {
        let path: Vec<String> = arg
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        session.options.search_path = Some(path);
    }
    let current = session
        .options
        .effective_search_path(&input.catalog.search_path)
        .join(",");
    session.console.write_line(&current)?;
    Ok(SessionControl::Continue)
}

pub fn clear(_input: &HandlerInput<'_>, session: &mut Session<'_>) -> HandlerResult {
    session.console.clear_screen()?;
    Ok(SessionControl::Continue)
}

pub fn exit(_input: &HandlerInput<'_>, _session: &mut Session<'_>) -> HandlerResult {
    tracing::info!("Session exit requested");
    Ok(SessionControl::Terminate { restart: false })
}

/// `{Table, Description}` for one connection, sorted by table name.
fn describe_connection(
    catalog: &Catalog,
    connection: &str,
    session: &mut Session<'_>,
) -> Result<(), MetaqueryError> {
    let tables = catalog
        .connection(connection)
        .ok_or_else(|| MetaqueryError::ConnectionNotFound {
            name: connection.to_string(),
        })?;
    let mut rows: Vec<Vec<String>> = tables
        .values()
        .map(|t| vec![t.name.clone(), t.description.clone()])
        .collect();
    sort_by_first_column(&mut rows);
    session
        .renderer
        .render(&["Table", "Description"], &rows, false)?;
    Ok(())
}

/// `{Column, Type, Description}` for one table, sorted by column name.
fn describe_table(table: &TableInfo, session: &mut Session<'_>) -> Result<(), MetaqueryError> {
    let mut rows: Vec<Vec<String>> = table
        .columns
        .values()
        .map(|c| vec![c.name.clone(), c.data_type.clone(), c.description.clone()])
        .collect();
    sort_by_first_column(&mut rows);
    session
        .renderer
        .render(&["Column", "Type", "Description"], &rows, false)?;
    Ok(())
}

/// Match `pattern` against table names in every connection.
fn search_tables(
    catalog: &Catalog,
    pattern: &str,
    session: &mut Session<'_>,
) -> Result<(), MetaqueryError> {
    let re = Regex::new(pattern).map_err(|e| MetaqueryError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for connection in catalog.connection_names() {
        let Some(tables) = catalog.connection(connection) else {
            continue;
        };
        let mut matched: Vec<Vec<String>> = tables
            .values()
            .filter(|t| re.is_match(&t.name))
            .map(|t| vec![t.name.clone(), connection.to_string()])
            .collect();
        sort_by_first_column(&mut matched);
        rows.append(&mut matched);
    }
    tracing::debug!(pattern, matches = rows.len(), "Table search");

    session.renderer.render(&["Table", "Schema"], &rows, true)?;
    Ok(())
}

fn parse_toggle(args: &[&str]) -> bool {
    args.first().is_some_and(|v| v.eq_ignore_ascii_case("on"))
}

fn sort_by_first_column(rows: &mut [Vec<String>]) {
    rows.sort_by(|a, b| a[0].cmp(&b[0]));
}
