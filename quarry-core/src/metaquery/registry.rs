//! Dot-command registry.
//!
//! Maps each command keyword (including its leading ".") to the validator,
//! handler, and completer that implement it. Built once per session and
//! never mutated afterwards.

use std::collections::BTreeMap;

use super::complete::{self, CompletionInput, Suggestion};
use super::handlers::{self, HandlerInput};
use super::session::{Session, SessionControl};
use super::validate::{self, Validator};
use crate::error::MetaqueryError;

/// Executes a validated command.
pub type Handler =
    fn(&HandlerInput<'_>, &mut Session<'_>) -> Result<SessionControl, MetaqueryError>;

/// Produces argument suggestions for a command. Must not have side effects.
pub type Completer = fn(&CompletionInput<'_>) -> Vec<Suggestion>;

/// Everything needed to validate, run, and complete one command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Registry key including the leading ".", e.g. ".inspect".
    pub keyword: &'static str,
    pub title: &'static str,
    /// One-line description shown in `.help` and completion.
    pub description: &'static str,
    /// Example arguments, e.g. `&["{connection}", "{connection}.{table}"]`.
    pub args: &'static [&'static str],
    pub validator: Validator,
    pub handler: Handler,
    pub completer: Option<Completer>,
}

/// Immutable keyword -> command table.
#[derive(Debug, Clone)]
pub struct Registry {
    commands: BTreeMap<&'static str, CommandSpec>,
}

impl Registry {
    /// Build a registry, rejecting duplicate keywords.
    pub fn new(specs: Vec<CommandSpec>) -> Result<Self, MetaqueryError> {
        let mut commands = BTreeMap::new();
        for spec in specs {
            let keyword = spec.keyword;
            if commands.insert(keyword, spec).is_some() {
                return Err(MetaqueryError::DuplicateCommand {
                    keyword: keyword.to_string(),
                });
            }
        }
        Ok(Self { commands })
    }

    /// A registry holding every built-in command.
    pub fn with_defaults() -> Self {
        let commands = default_commands()
            .into_iter()
            .map(|spec| (spec.keyword, spec))
            .collect();
        Self { commands }
    }

    /// Look up a command by its exact keyword.
    pub fn get(&self, keyword: &str) -> Option<&CommandSpec> {
        self.commands.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.commands.contains_key(keyword)
    }

    /// All commands, ordered by keyword.
    pub fn all(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Keywords starting with `prefix`, each described by its command description.
    pub fn keyword_suggestions(&self, prefix: &str) -> Vec<Suggestion> {
        self.commands
            .values()
            .filter(|cmd| cmd.keyword.starts_with(prefix))
            .map(|cmd| Suggestion::new(cmd.keyword, cmd.description))
            .collect()
    }

    /// Rows for `.help`: keyword with example arguments, and description.
    pub fn help_rows(&self) -> Vec<Vec<String>> {
        self.commands
            .values()
            .map(|cmd| {
                let usage = if cmd.args.is_empty() {
                    cmd.keyword.to_string()
                } else {
                    format!("{} {}", cmd.keyword, cmd.args.join("|"))
                };
                vec![usage, cmd.description.to_string()]
            })
            .collect()
    }

    /// Suggest the closest keyword for an unknown input using edit distance.
    pub fn suggest(&self, input: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for &keyword in self.commands.keys() {
            let dist = edit_distance(input, keyword);
            if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
                best = Some((keyword, dist));
            }
        }
        best.map(|(name, _)| name)
    }
}

/// Simple Levenshtein edit distance for command suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    let b_len = b_bytes.len();

    let mut prev = (0..=b_len).collect::<Vec<_>>();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_bytes.len() {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_bytes[i - 1] != b_bytes[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

fn toggle(
    title: &'static str,
    keyword: &'static str,
    description: &'static str,
    handler: Handler,
) -> CommandSpec {
    CommandSpec {
        keyword,
        title,
        description,
        args: &["on", "off"],
        validator: validate::boolean(title, keyword, vec![validate::on_off()]),
        handler,
        completer: Some(complete::on_off),
    }
}

/// The built-in command table.
pub fn default_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            keyword: ".help",
            title: "Help",
            description: "Show the list of dot-commands",
            args: &[],
            validator: validate::no_args(),
            handler: handlers::help,
            completer: None,
        },
        CommandSpec {
            keyword: ".connections",
            title: "Connections",
            description: "List connections and the plugins behind them",
            args: &[],
            validator: validate::no_args(),
            handler: handlers::list_connections,
            completer: None,
        },
        CommandSpec {
            keyword: ".tables",
            title: "Tables",
            description: "List or describe tables; a trailing * searches table names",
            args: &["{connection}", "{pattern}*"],
            validator: validate::at_most_n_args(1),
            handler: handlers::list_tables,
            completer: Some(complete::connections),
        },
        CommandSpec {
            keyword: ".inspect",
            title: "Inspect",
            description: "View connections, tables, and column information",
            args: &["{connection}", "{connection}.{table}", "{table}"],
            validator: validate::at_most_n_args(1),
            handler: handlers::inspect,
            completer: Some(complete::inspect_targets),
        },
        toggle(
            "Headers",
            ".header",
            "Enable or disable column headers",
            handlers::set_header,
        ),
        toggle(
            "Timing",
            ".timing",
            "Enable or disable query execution timing",
            handlers::set_timing,
        ),
        toggle(
            "Multi-line",
            ".multi",
            "Enable or disable multi-line mode",
            handlers::set_multiline,
        ),
        toggle(
            "Autocomplete",
            ".autocomplete",
            "Enable or disable the completion dropdown",
            handlers::set_autocomplete,
        ),
        CommandSpec {
            keyword: ".separator",
            title: "Separator",
            description: "Set the field separator for csv output",
            args: &["{separator}"],
            validator: validate::exactly_n_args(1),
            handler: handlers::set_separator,
            completer: None,
        },
        CommandSpec {
            keyword: ".output",
            title: "Output",
            description: "Set the output format",
            args: &["table", "csv", "json"],
            validator: validate::compose(vec![
                validate::exactly_n_args(1),
                validate::output_format(),
            ]),
            handler: handlers::set_output,
            completer: Some(complete::output_formats),
        },
        CommandSpec {
            keyword: ".search_path",
            title: "Search path",
            description: "Show the search path, or set it for this session",
            args: &["{connection},{connection}"],
            validator: validate::at_most_n_args(1),
            handler: handlers::search_path,
            completer: Some(complete::connections),
        },
        CommandSpec {
            keyword: ".clear",
            title: "Clear",
            description: "Clear the console",
            args: &[],
            validator: validate::no_args(),
            handler: handlers::clear,
            completer: None,
        },
        CommandSpec {
            keyword: ".exit",
            title: "Exit",
            description: "Exit from the console",
            args: &[],
            validator: validate::no_args(),
            handler: handlers::exit,
            completer: None,
        },
        CommandSpec {
            keyword: ".quit",
            title: "Exit",
            description: "Exit from the console",
            args: &[],
            validator: validate::no_args(),
            handler: handlers::exit,
            completer: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_duplicates() {
        let checked = Registry::new(default_commands()).unwrap();
        assert_eq!(checked.len(), Registry::with_defaults().len());
    }

    #[test]
    fn test_duplicate_keyword_rejected() {
        let mut specs = default_commands();
        let dup = specs[0].clone();
        specs.push(dup);
        let err = Registry::new(specs).unwrap_err();
        assert!(matches!(err, MetaqueryError::DuplicateCommand { keyword } if keyword == ".help"));
    }

    #[test]
    fn test_every_keyword_has_leading_dot() {
        for cmd in Registry::with_defaults().all() {
            assert!(cmd.keyword.starts_with('.'), "{}", cmd.keyword);
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = Registry::with_defaults();
        assert!(registry.get(".tables").is_some());
        assert!(registry.get(".TABLES").is_none());
        assert!(registry.get("tables").is_none());
    }

    #[test]
    fn test_exit_and_quit_alias_the_same_handler() {
        let registry = Registry::with_defaults();
        let exit = registry.get(".exit").unwrap();
        let quit = registry.get(".quit").unwrap();
        assert_eq!(exit.handler as usize, quit.handler as usize);
    }

    #[test]
    fn test_keyword_suggestions_prefix() {
        let registry = Registry::with_defaults();
        let texts: Vec<String> = registry
            .keyword_suggestions(".t")
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(texts, vec![".tables", ".timing"]);
    }

    #[test]
    fn test_keyword_suggestions_dot_only_lists_everything() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.keyword_suggestions(".").len(), registry.len());
    }

    #[test]
    fn test_help_rows_cover_all_commands() {
        let registry = Registry::with_defaults();
        let rows = registry.help_rows();
        assert_eq!(rows.len(), registry.len());
        assert!(rows.iter().any(|r| r[0] == ".output table|csv|json"));
    }

    #[test]
    fn test_suggest_close_match() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.suggest(".tabels"), Some(".tables"));
        assert_eq!(registry.suggest(".inspct"), Some(".inspect"));
    }

    #[test]
    fn test_suggest_no_match() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.suggest(".xyzzyplugh"), None);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("abc", "abc"), 0);
        assert_eq!(edit_distance("abc", "abd"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
    }
}
