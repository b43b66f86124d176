use snipcat_types::{Execution, SnippetOutput, SnippetRecord};

/// Snippets whose runtime error is part of the lesson.
#[derive(Debug, Clone, Default)]
pub struct ExpectedFailures {
    patterns: Vec<String>,
}

impl ExpectedFailures {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// A pattern matches a bare label, a full `section/label` path, or any
    /// section path prefix.
    pub fn matches(&self, record: &SnippetRecord) -> bool {
        let qualified = record.qualified_label();
        self.patterns.iter().any(|pattern| {
            *pattern == record.label
                || *pattern == qualified
                || qualified
                    .strip_prefix(pattern.as_str())
                    .map_or(false, |rest| rest.starts_with('/'))
        })
    }

    /// Reclassify a matching runtime error as success. Timeouts are never
    /// reclassified.
    pub fn apply(&self, record: &SnippetRecord, execution: Execution) -> Execution {
        match execution {
            Execution::RuntimeError { detail, logs } if self.matches(record) => {
                tracing::debug!(label = %record.label, kind = %detail.kind, "expected failure");
                Execution::Success {
                    output: SnippetOutput {
                        logs,
                        value: None,
                        expected_error: Some(detail),
                    },
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipcat_types::RuntimeFault;

    fn record(path: &[&str], label: &str) -> SnippetRecord {
        SnippetRecord::new(label, path.iter().map(|s| s.to_string()).collect(), 1, "x")
    }

    #[test]
    fn test_matches_label_path_and_prefix() {
        let policy = ExpectedFailures::new(vec!["ERROR HANDLING".into()]);
        assert!(policy.matches(&record(&["ERROR HANDLING"], "ERROR HANDLING")));
        assert!(policy.matches(&record(&["ERROR HANDLING"], "ERROR HANDLING (2)")));
        assert!(!policy.matches(&record(&["ERROR HANDLINGS"], "ERROR HANDLINGS")));

        let policy = ExpectedFailures::new(vec!["ES6+ FEATURES/Promises".into()]);
        assert!(policy.matches(&record(&["ES6+ FEATURES", "Promises"], "Promises (3)")));
        assert!(!policy.matches(&record(&["ES6+ FEATURES"], "ES6+ FEATURES (2)")));

        let policy = ExpectedFailures::new(vec!["Loops".into()]);
        assert!(policy.matches(&record(&["CONTROL FLOW", "Loops"], "Loops")));
    }

    #[test]
    fn test_apply_reclassifies_runtime_errors_only() {
        let policy = ExpectedFailures::new(vec!["JSON".into()]);
        let rec = record(&["JSON"], "JSON");

        let execution = policy.apply(&rec, Execution::fault("SyntaxError", "bad json"));
        match execution {
            Execution::Success { output } => {
                assert_eq!(
                    output.expected_error,
                    Some(RuntimeFault::new("SyntaxError", "bad json"))
                );
            }
            other => panic!("Expected Success, got: {:?}", other),
        }

        let timed_out = policy.apply(&rec, Execution::TimedOut { after_ms: 10 });
        assert_eq!(timed_out, Execution::TimedOut { after_ms: 10 });
    }

    #[test]
    fn test_empty_policy_is_faithful() {
        let policy = ExpectedFailures::default();
        assert!(policy.is_empty());
        let rec = record(&["JSON"], "JSON");
        let execution = policy.apply(&rec, Execution::fault("Error", "x"));
        assert!(matches!(execution, Execution::RuntimeError { .. }));
    }
}
