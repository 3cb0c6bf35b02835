//! Completion candidates for command arguments.

use crate::catalog::{Catalog, ConnectionDirectory};
use crate::options::OutputFormat;

/// A single completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub description: String,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
        }
    }
}

/// What a completer sees: the catalog snapshot and the argument being typed.
pub struct CompletionInput<'a> {
    /// The partial argument under the cursor.
    pub word: &'a str,
    pub catalog: &'a Catalog,
    pub connections: &'a ConnectionDirectory,
    /// Search path in effect for unqualified table names.
    pub search_path: &'a [String],
}

pub fn on_off(_input: &CompletionInput<'_>) -> Vec<Suggestion> {
    vec![Suggestion::new("on", ""), Suggestion::new("off", "")]
}

pub fn output_formats(_input: &CompletionInput<'_>) -> Vec<Suggestion> {
    OutputFormat::all()
        .iter()
        .map(|f| Suggestion::new(f.as_str(), "output format"))
        .collect()
}

/// Connection names, described by their plugin.
pub fn connections(input: &CompletionInput<'_>) -> Vec<Suggestion> {
    input
        .catalog
        .connection_names()
        .map(|name| {
            let plugin = input.connections.plugin_label(name);
            let description = if plugin.is_empty() {
                "connection".to_string()
            } else {
                format!("connection ({plugin})")
            };
            Suggestion::new(name, description)
        })
        .collect()
}

/// Connections, qualified `connection.table` names, and the unqualified
/// names of tables reachable through the search path.
///
/// Once the word contains a `.`, only the tables of the connection before
/// it are offered.
pub fn inspect_targets(input: &CompletionInput<'_>) -> Vec<Suggestion> {
    if let Some((connection, _)) = input.word.split_once('.') {
        return input
            .catalog
            .connection(connection)
            .map(|tables| {
                tables
                    .values()
                    .map(|t| {
                        Suggestion::new(format!("{connection}.{}", t.name), t.description.as_str())
                    })
                    .collect()
            })
            .unwrap_or_default();
    }

    let mut suggestions = connections(input);

    for connection in input.search_path {
        if let Some(tables) = input.catalog.connection(connection) {
            suggestions.extend(
                tables
                    .values()
                    .map(|t| Suggestion::new(t.name.as_str(), t.description.as_str())),
            );
        }
    }

    for connection in input.catalog.connection_names() {
        if let Some(tables) = input.catalog.connection(connection) {
            suggestions.extend(tables.values().map(|t| {
                Suggestion::new(format!("{connection}.{}", t.name), t.description.as_str())
            }));
        }
    }

    suggestions
}

/// Keep candidates starting with `prefix`, stable-sort by text, and drop
/// repeated texts (the first one generated wins).
pub fn finalize(mut suggestions: Vec<Suggestion>, prefix: &str) -> Vec<Suggestion> {
    suggestions.retain(|s| s.text.starts_with(prefix));
    suggestions.sort_by(|a, b| a.text.cmp(&b.text));
    suggestions.dedup_by(|later, earlier| later.text == earlier.text);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PluginInfo, TableInfo};
    use pretty_assertions::assert_eq;

    fn fixture() -> (Catalog, ConnectionDirectory) {
        let mut catalog = Catalog::new();
        catalog.insert_table("aws", TableInfo::new("ec2_instance", "EC2 instances"));
        catalog.insert_table("aws", TableInfo::new("ec2_vpc", "VPCs"));
        catalog.insert_table("gcp", TableInfo::new("compute_instance", "GCE instances"));
        catalog.search_path = vec!["aws".into()];
        let mut directory = ConnectionDirectory::new();
        directory.insert("aws", PluginInfo::new("aws"));
        (catalog, directory)
    }

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_connections_describe_plugin() {
        let (catalog, directory) = fixture();
        let input = CompletionInput {
            word: "",
            catalog: &catalog,
            connections: &directory,
            search_path: &catalog.search_path,
        };
        let suggestions = connections(&input);
        assert_eq!(suggestions[0], Suggestion::new("aws", "connection (aws)"));
        assert_eq!(suggestions[1], Suggestion::new("gcp", "connection"));
    }

    #[test]
    fn test_inspect_targets_include_qualified_and_search_path_tables() {
        let (catalog, directory) = fixture();
        let input = CompletionInput {
            word: "",
            catalog: &catalog,
            connections: &directory,
            search_path: &catalog.search_path,
        };
        let all = finalize(inspect_targets(&input), "");
        assert_eq!(
            texts(&all),
            vec![
                "aws",
                "aws.ec2_instance",
                "aws.ec2_vpc",
                "ec2_instance",
                "ec2_vpc",
                "gcp",
                "gcp.compute_instance",
            ]
        );
    }

    #[test]
    fn test_inspect_targets_narrow_to_one_connection_after_dot() {
        let (catalog, directory) = fixture();
        let input = CompletionInput {
            word: "aws.",
            catalog: &catalog,
            connections: &directory,
            search_path: &catalog.search_path,
        };
        let suggestions = inspect_targets(&input);
        assert_eq!(
            texts(&finalize(suggestions, input.word)),
            vec!["aws.ec2_instance", "aws.ec2_vpc"]
        );

        let unknown = CompletionInput {
            word: "azure.",
            ..input
        };
        assert!(inspect_targets(&unknown).is_empty());
    }

    #[test]
    fn test_finalize_filters_sorts_and_dedups() {
        let suggestions = vec![
            Suggestion::new("b", "first b"),
            Suggestion::new("a", ""),
            Suggestion::new("b", "second b"),
            Suggestion::new("c", ""),
        ];
        let result = finalize(suggestions, "b");
        assert_eq!(result, vec![Suggestion::new("b", "first b")]);
    }
}
