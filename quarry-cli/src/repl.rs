//! REPL (Read-Eval-Print Loop) for interactive and batch modes.

use crate::render::{TerminalConsole, TerminalRenderer, format_results};
use crate::repl_input::ReplInput;
use quarry_core::metaquery::{Console, TableRenderer};
use quarry_core::{Interpreter, Session, SessionControl, SessionOptions};
use std::time::{Duration, Instant};

/// Prompt shown when no statement is being accumulated.
pub const PROMPT: &str = "> ";
/// Prompt shown while a multi-line statement is incomplete.
pub const CONTINUATION_PROMPT: &str = ">> ";

/// Tabular result of a forwarded statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Executes statements that are not metaqueries.
pub trait QueryEngine {
    fn execute(&mut self, statement: &str) -> anyhow::Result<QueryResult>;
}

/// The engine used when the console runs without a database behind it.
pub struct DetachedEngine;

impl QueryEngine for DetachedEngine {
    fn execute(&mut self, _statement: &str) -> anyhow::Result<QueryResult> {
        anyhow::bail!("no query engine attached")
    }
}

/// One console session: the interpreter, its options, and a query engine.
pub struct Repl {
    interpreter: Interpreter,
    engine: Box<dyn QueryEngine>,
    options: SessionOptions,
    /// Statement text accumulated in multi-line mode.
    pending: String,
}

impl Repl {
    pub fn new(
        interpreter: Interpreter,
        engine: Box<dyn QueryEngine>,
        options: SessionOptions,
    ) -> Self {
        Self {
            interpreter,
            engine,
            options,
            pending: String::new(),
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn prompt(&self) -> &'static str {
        if self.pending.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        }
    }

    /// Process one line of input.
    ///
    /// Metaquery failures are printed and the session continues; only an
    /// I/O error writing to the console is returned.
    pub fn process_line(
        &mut self,
        line: &str,
        console: &mut dyn Console,
        renderer: &mut dyn TableRenderer,
    ) -> anyhow::Result<SessionControl> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(SessionControl::Continue);
        }

        // Dot-commands run immediately, even mid-statement. Everything else,
        // including a bare "." or an unregistered keyword, is a statement.
        if self.interpreter.is_metaquery(trimmed) {
            let control = self.run_metaquery(trimmed, console, renderer)?;
            self.drop_stale_pending(console)?;
            return Ok(control);
        }

        if self.options.multiline {
            if !self.pending.is_empty() {
                self.pending.push('\n');
            }
            self.pending.push_str(trimmed);
            if !trimmed.ends_with(';') {
                return Ok(SessionControl::Continue);
            }
            let statement = std::mem::take(&mut self.pending);
            self.run_statement(&statement, console)?;
        } else {
            self.run_statement(trimmed, console)?;
        }
        Ok(SessionControl::Continue)
    }

    fn run_metaquery(
        &mut self,
        line: &str,
        console: &mut dyn Console,
        renderer: &mut dyn TableRenderer,
    ) -> anyhow::Result<SessionControl> {
        let validation = self.interpreter.validate(line);
        if let Some(message) = &validation.message {
            console.write_line(message)?;
        }
        if let Some(err) = &validation.error {
            console.write_line(&format!("Error: {err}"))?;
            return Ok(SessionControl::Continue);
        }
        if !validation.should_run {
            return Ok(SessionControl::Continue);
        }

        let mut session = Session::new(&mut self.options, console, renderer);
        match self.interpreter.handle(line, &mut session) {
            Ok(control @ SessionControl::Terminate { restart }) => {
                tracing::info!(restart, "Session terminated");
                Ok(control)
            }
            Ok(control) => Ok(control),
            Err(err) => {
                tracing::debug!(error = %err, "Metaquery failed");
                console.write_line(&format!("Error: {err}"))?;
                Ok(SessionControl::Continue)
            }
        }
    }

    /// A statement left half-typed when multi-line mode is switched off is
    /// discarded so it cannot leak into a later statement.
    fn drop_stale_pending(&mut self, console: &mut dyn Console) -> anyhow::Result<()> {
        if self.options.multiline || self.pending.is_empty() {
            return Ok(());
        }
        tracing::debug!(chars = self.pending.len(), "Discarding incomplete statement");
        self.pending.clear();
        console.write_line("Incomplete statement discarded")?;
        Ok(())
    }

    /// Suggest a dot-command when the engine rejected something that looks
    /// like a mistyped one.
    fn hint_keyword(&self, statement: &str, console: &mut dyn Console) -> anyhow::Result<()> {
        let Some(token) = statement.split_whitespace().next() else {
            return Ok(());
        };
        let token = token.trim_end_matches(';');
        if !token.starts_with('.') {
            return Ok(());
        }
        if let Some(keyword) = self.interpreter.registry().suggest(token) {
            console.write_line(&format!("Hint: did you mean '{keyword}'?"))?;
        }
        Ok(())
    }

    fn run_statement(&mut self, statement: &str, console: &mut dyn Console) -> anyhow::Result<()> {
        let start = Instant::now();
        let result = self.engine.execute(statement);
        let elapsed = start.elapsed();

        match result {
            Ok(result) => {
                let text = format_results(&self.options, &result.columns, &result.rows);
                console.write_line(&text)?;
            }
            Err(err) => {
                tracing::debug!(error = %err, "Statement failed");
                console.write_line(&format!("Error: {err}"))?;
                self.hint_keyword(statement, console)?;
            }
        }
        if self.options.timing {
            console.write_line(&format_elapsed(elapsed))?;
        }
        Ok(())
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("Time: {:.1}ms", elapsed.as_secs_f64() * 1000.0)
}

/// Run the interactive session until `.exit`, `.quit`, or Ctrl-D.
pub fn run_interactive(repl: &mut Repl, input: &mut ReplInput) -> anyhow::Result<()> {
    println!("\x1b[1;34mQuarry\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
    println!("Type \x1b[1m.help\x1b[0m for commands, \x1b[1m.exit\x1b[0m to quit.\n");

    let mut console = TerminalConsole;
    let mut renderer = TerminalRenderer::stdout();

    loop {
        let Some(line) = input.read_line(repl.prompt(), repl.interpreter(), repl.options())?
        else {
            break;
        };
        if let SessionControl::Terminate { .. } =
            repl.process_line(&line, &mut console, &mut renderer)?
        {
            break;
        }
    }
    Ok(())
}

/// Run each line in order, stopping early if one ends the session.
pub fn run_batch(repl: &mut Repl, lines: &[String]) -> anyhow::Result<()> {
    let mut console = TerminalConsole;
    let mut renderer = TerminalRenderer::stdout();
    run_lines(repl, lines, &mut console, &mut renderer)
}

fn run_lines(
    repl: &mut Repl,
    lines: &[String],
    console: &mut dyn Console,
    renderer: &mut dyn TableRenderer,
) -> anyhow::Result<()> {
    for line in lines {
        if let SessionControl::Terminate { .. } = repl.process_line(line, console, renderer)? {
            break;
        }
    }
    Ok(())
}
