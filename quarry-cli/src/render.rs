//! Terminal output: table rendering, console control, and result formatting.

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use crossterm::{cursor, execute, terminal};
use quarry_core::metaquery::{Console, TableRenderer};
use quarry_core::{OutputFormat, SessionOptions};
use std::io::{self, Write};

/// Blank out cells equal to the cell directly above them in the same column.
fn merge_repeated_cells(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut merged: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let out = row
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                let above = i.checked_sub(1).and_then(|prev| rows[prev].get(col));
                if above == Some(cell) {
                    String::new()
                } else {
                    cell.clone()
                }
            })
            .collect();
        merged.push(out);
    }
    merged
}

fn build_table(header: &[&str], rows: &[Vec<String>], merge_cells: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());

    let body = if merge_cells {
        merge_repeated_cells(rows)
    } else {
        rows.to_vec()
    };
    for row in body {
        table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }
    table
}

/// Renders tables to a writer with `comfy-table`.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TableRenderer for TerminalRenderer<W> {
    fn render(
        &mut self,
        header: &[&str],
        rows: &[Vec<String>],
        merge_cells: bool,
    ) -> io::Result<()> {
        let table = build_table(header, rows, merge_cells);
        writeln!(self.out, "{table}")?;
        self.out.flush()
    }
}

/// The interactive terminal.
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn clear_screen(&mut self) -> io::Result<()> {
        execute!(
            io::stdout(),
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }
}

/// Quote a field that contains the separator, a quote, or a line break,
/// doubling embedded quotes.
fn escape_csv(value: &str, sep: &str) -> String {
    let needs_quotes = (!sep.is_empty() && value.contains(sep))
        || value.contains(['"', '\n', '\r']);
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_record(fields: &[String], sep: &str) -> String {
    fields
        .iter()
        .map(|f| escape_csv(f, sep))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Format query results according to the session's output options.
pub fn format_results(
    options: &SessionOptions,
    columns: &[String],
    rows: &[Vec<String>],
) -> String {
    match options.output {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic);
            if options.header {
                table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());
            }
            for row in rows {
                table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
            }
            table.to_string()
        }
        OutputFormat::Csv => {
            let sep = options.separator.as_str();
            let mut lines = Vec::with_capacity(rows.len() + 1);
            if options.header {
                lines.push(csv_record(columns, sep));
            }
            lines.extend(rows.iter().map(|r| csv_record(r, sep)));
            lines.join("\n")
        }
        OutputFormat::Json => {
            let records: Vec<serde_json::Map<String, serde_json::Value>> = rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned().map(serde_json::Value::String))
                        .collect()
                })
                .collect();
            serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_merge_blanks_repeated_cells() {
        let merged = merge_repeated_cells(&rows(&[
            &["ec2_instance", "aws"],
            &["ec2_vpc", "aws"],
            &["compute_instance", "gcp"],
        ]));
        assert_eq!(
            merged,
            rows(&[
                &["ec2_instance", "aws"],
                &["ec2_vpc", ""],
                &["compute_instance", "gcp"],
            ])
        );
    }

    #[test]
    fn test_renderer_writes_header_and_cells() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer
            .render(&["Table", "Description"], &rows(&[&["ec2_vpc", "VPCs"]]), false)
            .unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("Table"));
        assert!(text.contains("ec2_vpc"));
        assert!(text.contains("VPCs"));
    }

    #[test]
    fn test_format_csv_respects_header_and_separator() {
        let mut options = SessionOptions::default();
        options.output = OutputFormat::Csv;
        options.separator = "|".into();
        let columns = vec!["name".to_string(), "region".to_string()];
        let data = rows(&[&["a", "us-east-1"], &["b", "eu-west-1"]]);

        assert_eq!(
            format_results(&options, &columns, &data),
            "name|region\na|us-east-1\nb|eu-west-1"
        );

        options.header = false;
        assert_eq!(
            format_results(&options, &columns, &data),
            "a|us-east-1\nb|eu-west-1"
        );
    }

    #[test]
    fn test_format_csv_quotes_special_fields() {
        let mut options = SessionOptions::default();
        options.output = OutputFormat::Csv;
        let columns = vec!["name".to_string()];
        let data = rows(&[&["a,b"], &["say \"hi\""], &["two\nlines"], &["plain"]]);

        assert_eq!(
            format_results(&options, &columns, &data),
            "name\n\"a,b\"\n\"say \"\"hi\"\"\"\n\"two\nlines\"\nplain"
        );
    }

    #[test]
    fn test_escape_csv_follows_session_separator() {
        assert_eq!(escape_csv("a,b", "|"), "a,b");
        assert_eq!(escape_csv("a|b", "|"), "\"a|b\"");
        assert_eq!(escape_csv("x", ""), "x");
    }

    #[test]
    fn test_format_json_records() {
        let mut options = SessionOptions::default();
        options.output = OutputFormat::Json;
        let columns = vec!["name".to_string()];
        let text = format_results(&options, &columns, &rows(&[&["a"]]));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, serde_json::json!([{ "name": "a" }]));
    }

    #[test]
    fn test_format_table_without_header() {
        let mut options = SessionOptions::default();
        options.header = false;
        let columns = vec!["name".to_string()];
        let text = format_results(&options, &columns, &rows(&[&["alpha"]]));
        assert!(text.contains("alpha"));
        assert!(!text.contains("name"));
    }
}
