//! Collaborators a handler acts through, and the session control outcome.

use std::io;

use crate::options::SessionOptions;

/// What the REPL loop should do after a command has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    /// Read the next line.
    Continue,
    /// End the interactive session.
    Terminate { restart: bool },
}

/// Renders tabular output.
pub trait TableRenderer {
    /// Render one table. With `merge_cells`, a cell equal to the one above it
    /// in the same column is drawn blank.
    fn render(&mut self, header: &[&str], rows: &[Vec<String>], merge_cells: bool)
    -> io::Result<()>;
}

/// The interactive console the session is attached to.
pub trait Console {
    fn clear_screen(&mut self) -> io::Result<()>;

    /// Print one line of plain text.
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Mutable per-session state handed to each handler call.
pub struct Session<'a> {
    pub options: &'a mut SessionOptions,
    pub console: &'a mut dyn Console,
    pub renderer: &'a mut dyn TableRenderer,
}

impl<'a> Session<'a> {
    pub fn new(
        options: &'a mut SessionOptions,
        console: &'a mut dyn Console,
        renderer: &'a mut dyn TableRenderer,
    ) -> Self {
        Self {
            options,
            console,
            renderer,
        }
    }
}

/// A console and renderer that record everything, for tests and batch capture.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub lines: Vec<String>,
    pub clears: usize,
}

/// A rendered table captured by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub merge_cells: bool,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub tables: Vec<RenderedTable>,
}

impl Console for RecordingOutput {
    fn clear_screen(&mut self) -> io::Result<()> {
        self.clears += 1;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

impl TableRenderer for RecordingRenderer {
    fn render(
        &mut self,
        header: &[&str],
        rows: &[Vec<String>],
        merge_cells: bool,
    ) -> io::Result<()> {
        self.tables.push(RenderedTable {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: rows.to_vec(),
            merge_cells,
        });
        Ok(())
    }
}
