//! Composable argument validators for dot-commands.
//!
//! A validator classifies the argument string that follows a command keyword
//! as runnable, informational-only, or invalid. Informational messages are
//! shown regardless of the outcome.

use std::fmt;
use std::sync::Arc;

use crate::error::MetaqueryError;
use crate::options::OutputFormat;

/// Outcome of validating a command's arguments.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Proceed to the handler.
    pub should_run: bool,
    /// Abort with this error.
    pub error: Option<MetaqueryError>,
    /// Informational text to show whatever the outcome.
    pub message: Option<String>,
}

impl ValidationResult {
    /// Valid; run the handler.
    pub fn ok() -> Self {
        Self {
            should_run: true,
            ..Self::default()
        }
    }

    /// Nothing to execute, but not an error either.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            should_run: false,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn fail(error: MetaqueryError) -> Self {
        Self {
            should_run: false,
            error: Some(error),
            message: None,
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    fn prepend_messages(mut self, prior: &[String]) -> Self {
        if prior.is_empty() {
            return self;
        }
        let mut all = prior.to_vec();
        all.extend(self.message.take());
        self.message = Some(all.join("\n"));
        self
    }
}

/// A pure function from a command's argument string to a [`ValidationResult`].
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&str) -> ValidationResult + Send + Sync>);

impl Validator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> ValidationResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn validate(&self, args: &str) -> ValidationResult {
        (self.0)(args)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator")
    }
}

/// Split an argument string into whitespace-separated tokens.
pub fn tokenize(args: &str) -> Vec<&str> {
    args.split_whitespace().collect()
}

/// Valid iff there are no arguments.
pub fn no_args() -> Validator {
    Validator::new(|args| {
        let actual = tokenize(args).len();
        if actual == 0 {
            ValidationResult::ok()
        } else {
            ValidationResult::fail(MetaqueryError::NoArguments { actual })
        }
    })
}

/// Valid iff there are exactly `n` arguments.
pub fn exactly_n_args(n: usize) -> Validator {
    Validator::new(move |args| {
        let actual = tokenize(args).len();
        if actual == n {
            ValidationResult::ok()
        } else {
            ValidationResult::fail(MetaqueryError::ArgumentCount {
                expected: n,
                actual,
            })
        }
    })
}

/// Valid iff there are at most `n` arguments.
pub fn at_most_n_args(n: usize) -> Validator {
    Validator::new(move |args| {
        let actual = tokenize(args).len();
        if actual <= n {
            ValidationResult::ok()
        } else {
            ValidationResult::fail(MetaqueryError::TooManyArguments { max: n, actual })
        }
    })
}

/// Every argument must match one of `values`.
pub fn allowed_values(case_sensitive: bool, values: &[&str]) -> Validator {
    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    Validator::new(move |args| {
        let offending = tokenize(args).into_iter().find(|token| {
            !values.iter().any(|v| {
                if case_sensitive {
                    v == token
                } else {
                    v.eq_ignore_ascii_case(token)
                }
            })
        });
        match offending {
            Some(token) => ValidationResult::fail(MetaqueryError::InvalidValue {
                value: token.to_string(),
                allowed: values.join(", "),
            }),
            None => ValidationResult::ok(),
        }
    })
}

/// Exactly one argument, naming a recognized [`OutputFormat`].
pub fn output_format() -> Validator {
    Validator::new(|args| match tokenize(args).as_slice() {
        [token] if token.parse::<OutputFormat>().is_ok() => ValidationResult::ok(),
        [token] => ValidationResult::fail(MetaqueryError::InvalidOutputFormat {
            value: token.to_string(),
            allowed: OutputFormat::allowed_list(),
        }),
        tokens => ValidationResult::fail(MetaqueryError::ArgumentCount {
            expected: 1,
            actual: tokens.len(),
        }),
    })
}

/// Validator for an on/off toggle command.
///
/// With no arguments nothing runs and an informational hint is returned
/// instead. The hint is static; it does not reflect the live option value.
pub fn boolean(title: &str, keyword: &str, inner: Vec<Validator>) -> Validator {
    let hint = format!("{title} mode is off. You can turn it on with: {keyword} on");
    let inner = compose(inner);
    Validator::new(move |args| {
        let actual = tokenize(args).len();
        match actual {
            0 => ValidationResult::info(hint.clone()),
            1 => inner.validate(args),
            _ => ValidationResult::fail(MetaqueryError::ArgumentCount {
                expected: 1,
                actual,
            }),
        }
    })
}

/// Case-insensitive on/off toggle; the usual inner validator for [`boolean`].
pub fn on_off() -> Validator {
    allowed_values(false, &["on", "off"])
}

/// Run validators left to right.
///
/// The first error stops the chain; so does a result that is neither an
/// error nor runnable. Messages from every validator that ran are joined.
pub fn compose(validators: Vec<Validator>) -> Validator {
    Validator::new(move |args| {
        let mut messages: Vec<String> = Vec::new();
        for validator in &validators {
            let mut result = validator.validate(args);
            if result.is_err() || !result.should_run {
                return result.prepend_messages(&messages);
            }
            messages.extend(result.message.take());
        }
        let mut result = ValidationResult::ok();
        if !messages.is_empty() {
            result.message = Some(messages.join("\n"));
        }
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ok(result: &ValidationResult) {
        assert!(result.should_run, "expected runnable, got {result:?}");
        assert!(result.error.is_none());
    }

    #[test]
    fn test_no_args() {
        assert_ok(&no_args().validate(""));
        assert_ok(&no_args().validate("   "));
        let result = no_args().validate("x y");
        assert!(matches!(
            result.error,
            Some(MetaqueryError::NoArguments { actual: 2 })
        ));
    }

    #[test]
    fn test_exactly_n_args() {
        assert_ok(&exactly_n_args(1).validate("csv"));
        let result = exactly_n_args(1).validate("");
        assert!(matches!(
            result.error,
            Some(MetaqueryError::ArgumentCount {
                expected: 1,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_at_most_n_args() {
        assert_ok(&at_most_n_args(1).validate(""));
        assert_ok(&at_most_n_args(1).validate("aws"));
        let result = at_most_n_args(1).validate("aws gcp");
        assert!(matches!(
            result.error,
            Some(MetaqueryError::TooManyArguments { max: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_allowed_values_case_sensitivity() {
        assert_ok(&allowed_values(false, &["on", "off"]).validate("ON"));
        let result = allowed_values(true, &["on", "off"]).validate("ON");
        match result.error {
            Some(MetaqueryError::InvalidValue { value, allowed }) => {
                assert_eq!(value, "ON");
                assert_eq!(allowed, "on, off");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_allowed_values_reports_first_violation() {
        let result = allowed_values(true, &["a"]).validate("a b c");
        match result.error {
            Some(MetaqueryError::InvalidValue { value, .. }) => assert_eq!(value, "b"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_boolean_zero_args_is_informational() {
        let v = boolean("Timing", ".timing", vec![on_off()]);
        let result = v.validate("");
        assert!(!result.should_run);
        assert!(result.error.is_none());
        let msg = result.message.unwrap();
        assert!(msg.contains(".timing on"), "{msg}");
    }

    #[test]
    fn test_boolean_values() {
        let v = boolean("Timing", ".timing", vec![on_off()]);
        assert_ok(&v.validate("on"));
        assert_ok(&v.validate("OFF"));
        assert!(v.validate("maybe").is_err());
        let result = v.validate("on off");
        assert!(matches!(
            result.error,
            Some(MetaqueryError::ArgumentCount { expected: 1, .. })
        ));
    }

    #[test]
    fn test_output_format_validator() {
        assert_ok(&output_format().validate("json"));
        let result = output_format().validate("yaml");
        let err = result.error.unwrap();
        assert!(err.to_string().contains("invalid output format"));
        assert!(err.to_string().contains("yaml"));
    }

    #[test]
    fn test_output_format_requires_exactly_one_token() {
        for args in ["", "json csv"] {
            let result = output_format().validate(args);
            assert!(!result.should_run, "{args:?}");
            assert!(
                matches!(result.error, Some(MetaqueryError::ArgumentCount { expected: 1, .. })),
                "{args:?}"
            );
        }
    }

    #[test]
    fn test_compose_short_circuits_on_error() {
        let noisy = Validator::new(|_| ValidationResult {
            should_run: true,
            error: None,
            message: Some("first".into()),
        });
        let failing = Validator::new(|_| ValidationResult {
            should_run: false,
            error: Some(MetaqueryError::NoArguments { actual: 1 }),
            message: Some("second".into()),
        });
        let never = Validator::new(|_| panic!("chain should have stopped"));

        let result = compose(vec![noisy, failing, never]).validate("x");
        assert!(result.is_err());
        assert_eq!(result.message.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn test_compose_stops_on_informational() {
        let info = Validator::new(|_| ValidationResult::info("nothing to do"));
        let never = Validator::new(|_| panic!("chain should have stopped"));
        let result = compose(vec![info, never]).validate("");
        assert!(!result.should_run);
        assert!(!result.is_err());
        assert_eq!(result.message.as_deref(), Some("nothing to do"));
    }

    #[test]
    fn test_compose_accumulates_messages_when_all_pass() {
        let a = Validator::new(|_| ValidationResult {
            should_run: true,
            error: None,
            message: Some("a".into()),
        });
        let b = Validator::new(|_| ValidationResult::ok());
        let result = compose(vec![a, b]).validate("");
        assert!(result.should_run);
        assert_eq!(result.message.as_deref(), Some("a"));
    }

    #[test]
    fn test_compose_empty_is_ok() {
        assert_ok(&compose(Vec::new()).validate("anything"));
    }
}
