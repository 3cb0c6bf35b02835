//! Property-based tests for the metaquery interpreter using proptest.

use std::sync::Arc;

use proptest::prelude::*;

use quarry_core::metaquery::session::{RecordingOutput, RecordingRenderer};
use quarry_core::metaquery::Registry;
use quarry_core::{
    CatalogSnapshot, Interpreter, MetaqueryError, OutputFormat, Session, SessionOptions,
    SharedCatalog,
};

fn interpreter() -> Interpreter {
    Interpreter::with_defaults(Arc::new(SharedCatalog::new(CatalogSnapshot::default())))
}

fn keywords() -> Vec<&'static str> {
    Registry::with_defaults().all().map(|c| c.keyword).collect()
}

const TOGGLES: &[&str] = &[".header", ".timing", ".multi", ".autocomplete"];

// --- Recognition ---

proptest! {
    #[test]
    fn non_dot_lines_are_not_metaqueries(line in "[a-zA-Z0-9_ ;*,]{0,40}") {
        prop_assume!(!line.trim_start().starts_with('.'));
        prop_assert!(!interpreter().is_metaquery(&line));
    }

    #[test]
    fn unregistered_dot_tokens_are_not_metaqueries(token in "[a-z_]{0,12}") {
        let keyword = format!(".{token}");
        prop_assume!(!keywords().contains(&keyword.as_str()));
        prop_assert!(!interpreter().is_metaquery(&keyword));
    }

    #[test]
    fn registered_keywords_are_metaqueries_with_any_args(
        idx in 0usize..64,
        args in "[a-zA-Z0-9_. ]{0,30}",
        terminated in any::<bool>(),
    ) {
        let keywords = keywords();
        let keyword = keywords[idx % keywords.len()];
        let mut line = format!("{keyword} {args}");
        if terminated {
            line.push(';');
        }
        prop_assert!(interpreter().is_metaquery(&line));
    }
}

// --- Validation ---

proptest! {
    #[test]
    fn validation_errors_never_run(
        idx in 0usize..64,
        args in "[a-zA-Z0-9_.*, ]{0,30}",
    ) {
        let keywords = keywords();
        let keyword = keywords[idx % keywords.len()];
        let result = interpreter().validate(&format!("{keyword} {args}"));
        if result.is_err() {
            prop_assert!(!result.should_run);
        }
    }

    #[test]
    fn toggles_accept_on_off_in_any_case(
        idx in 0usize..4,
        value in "(?i)(on|off)",
    ) {
        let result = interpreter().validate(&format!("{} {value}", TOGGLES[idx]));
        prop_assert!(result.should_run);
        prop_assert!(!result.is_err());
    }

    #[test]
    fn toggles_reject_other_single_tokens(idx in 0usize..4, value in "[a-z0-9]{1,8}") {
        prop_assume!(!value.eq_ignore_ascii_case("on") && !value.eq_ignore_ascii_case("off"));
        let result = interpreter().validate(&format!("{} {value}", TOGGLES[idx]));
        prop_assert!(matches!(result.error, Some(MetaqueryError::InvalidValue { .. })), "expected InvalidValue error");
    }

    #[test]
    fn toggles_reject_multiple_tokens(
        idx in 0usize..4,
        values in prop::collection::vec("[a-z]{1,5}", 2..5),
    ) {
        let line = format!("{} {}", TOGGLES[idx], values.join(" "));
        let result = interpreter().validate(&line);
        let is_count_error = matches!(
            result.error,
            Some(MetaqueryError::ArgumentCount { expected: 1, .. })
        );
        prop_assert!(is_count_error);
    }

    #[test]
    fn output_rejects_everything_outside_the_enumeration(value in "[a-zA-Z0-9_]{1,10}") {
        prop_assume!(value.parse::<OutputFormat>().is_err());
        let result = interpreter().validate(&format!(".output {value}"));
        let err = result.error.expect("format should be rejected");
        prop_assert!(err.to_string().contains("invalid output format"));
    }
}

#[test]
fn toggles_without_arguments_show_the_on_hint() {
    let interp = interpreter();
    for keyword in TOGGLES {
        let result = interp.validate(keyword);
        assert!(!result.should_run);
        assert!(!result.is_err());
        let message = result.message.expect("hint message");
        assert!(message.contains(&format!("{keyword} on")), "{message}");
    }
}

#[test]
fn output_accepts_every_recognized_format() {
    let interp = interpreter();
    for format in OutputFormat::all() {
        let result = interp.validate(&format!(".output {format}"));
        assert!(result.should_run, "{format} should validate");
    }
}

// --- Dispatch ---

proptest! {
    #[test]
    fn handle_unknown_keyword_names_the_token(
        token in "\\.[a-z]{1,10}",
        args in prop::collection::vec("[a-z0-9]{1,5}", 0..4),
    ) {
        prop_assume!(!keywords().contains(&token.as_str()));
        let interp = interpreter();
        let mut options = SessionOptions::default();
        let mut console = RecordingOutput::default();
        let mut renderer = RecordingRenderer::default();
        let mut session = Session::new(&mut options, &mut console, &mut renderer);

        let line = format!("{token} {}", args.join(" "));
        let err = interp.handle(&line, &mut session).unwrap_err();
        prop_assert!(err.to_string().contains(&token));
    }

    #[test]
    fn completion_is_sorted_and_never_panics(line in "\\.?[a-z_]{0,10} ?[a-z.]{0,8}") {
        let suggestions = interpreter().complete(&line, &SessionOptions::default());
        let texts: Vec<&str> = suggestions.iter().map(|s| s.text.as_str()).collect();
        let mut sorted = texts.clone();
        sorted.sort();
        prop_assert_eq!(texts, sorted);
    }
}
