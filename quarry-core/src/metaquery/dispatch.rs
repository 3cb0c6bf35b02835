//! Entry points the REPL calls for each line of input.

use std::sync::Arc;

use super::complete::{self, CompletionInput, Suggestion};
use super::handlers::HandlerInput;
use super::registry::Registry;
use super::session::{Session, SessionControl};
use super::validate::ValidationResult;
use crate::catalog::CatalogProvider;
use crate::error::MetaqueryError;
use crate::options::SessionOptions;

/// Statement terminator stripped from the end of a line.
const TERMINATOR: char = ';';

/// Strip surrounding whitespace and one trailing terminator.
pub fn trim_terminator(line: &str) -> &str {
    let line = line.trim();
    line.strip_suffix(TERMINATOR).unwrap_or(line).trim_end()
}

/// Split a line into its keyword and the raw argument remainder.
fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    }
}

/// The metaquery interpreter: a registry bound to a catalog source.
///
/// Holds no session state. Every call reads the provider's current snapshot
/// once, so a catalog replaced between commands is seen by the next one.
pub struct Interpreter {
    registry: Registry,
    catalog: Arc<dyn CatalogProvider>,
}

impl Interpreter {
    pub fn new(registry: Registry, catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { registry, catalog }
    }

    /// An interpreter over the built-in command set.
    pub fn with_defaults(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self::new(Registry::with_defaults(), catalog)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether `line` is a dot-command this interpreter knows.
    pub fn is_metaquery(&self, line: &str) -> bool {
        let line = trim_terminator(line);
        if !line.starts_with('.') {
            return false;
        }
        let (keyword, _) = split_command(line);
        self.registry.contains(keyword)
    }

    /// Run the command's validator over its arguments.
    ///
    /// An unknown keyword yields an error result rather than a panic, so a
    /// mistyped command gets a useful message.
    pub fn validate(&self, line: &str) -> ValidationResult {
        let line = trim_terminator(line);
        let (keyword, args) = split_command(line);
        match self.registry.get(keyword) {
            Some(cmd) => {
                let result = cmd.validator.validate(args);
                tracing::debug!(
                    keyword,
                    should_run = result.should_run,
                    failed = result.is_err(),
                    "Validated metaquery"
                );
                result
            }
            None => {
                tracing::warn!(keyword, "Unknown metaquery");
                ValidationResult::fail(MetaqueryError::UnknownCommand {
                    command: keyword.to_string(),
                    suggestion: self.registry.suggest(keyword).map(String::from),
                })
            }
        }
    }

    /// Execute the command's handler.
    ///
    /// Callers must have run [`validate`](Self::validate) first and acted on
    /// its result; no validation happens here.
    pub fn handle(
        &self,
        line: &str,
        session: &mut Session<'_>,
    ) -> Result<SessionControl, MetaqueryError> {
        let line = trim_terminator(line);
        let (keyword, args) = split_command(line);
        let Some(cmd) = self.registry.get(keyword) else {
            return Err(MetaqueryError::Unhandled {
                command: keyword.to_string(),
            });
        };

        let snapshot = self.catalog.snapshot();
        let input = HandlerInput {
            args: args.split_whitespace().collect(),
            catalog: &snapshot.catalog,
            connections: &snapshot.connections,
            registry: &self.registry,
        };
        tracing::debug!(keyword, args = input.args.len(), "Handling metaquery");
        (cmd.handler)(&input, session)
    }

    /// Completion candidates for a partially typed line.
    ///
    /// While the keyword is still being typed, keywords with that prefix are
    /// offered. Afterwards the command's completer runs; a command without
    /// one yields nothing.
    pub fn complete(&self, line: &str, options: &SessionOptions) -> Vec<Suggestion> {
        let trimmed = line.trim_start();
        let trimmed = trimmed.strip_suffix(TERMINATOR).unwrap_or(trimmed);

        let Some((keyword, rest)) = trimmed.split_once(char::is_whitespace) else {
            if !trimmed.starts_with('.') {
                return Vec::new();
            }
            return complete::finalize(self.registry.keyword_suggestions(trimmed), trimmed);
        };

        let Some(completer) = self.registry.get(keyword).and_then(|cmd| cmd.completer) else {
            return Vec::new();
        };

        // The word under the cursor: empty right after whitespace.
        let word = if rest.ends_with(char::is_whitespace) || rest.is_empty() {
            ""
        } else {
            rest.split_whitespace().last().unwrap_or("")
        };

        let snapshot = self.catalog.snapshot();
        let input = CompletionInput {
            word,
            catalog: &snapshot.catalog,
            connections: &snapshot.connections,
            search_path: options.effective_search_path(&snapshot.catalog.search_path),
        };
        complete::finalize(completer(&input), word)
    }
}
