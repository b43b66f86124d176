//! Snippet record model shared by the extractor, validator, sandbox and
//! catalogue builder.
//!
//! A record moves through a fixed state machine:
//! `Unchecked -> {Valid, SyntaxError}` during validation, then
//! `Valid + NotRun -> {Success, RuntimeError, TimedOut}` during execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One labeled snippet of the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetRecord {
    /// Identifier derived from the nearest preceding heading.
    pub label: String,

    /// Ancestor headings, outermost first.
    pub section_path: Vec<String>,

    /// 1-based document line of the first source line.
    pub line: usize,

    /// Exact snippet text.
    #[serde(rename = "source")]
    pub source_text: String,

    pub validation: Validation,

    pub execution: Execution,
}

impl SnippetRecord {
    pub fn new(
        label: impl Into<String>,
        section_path: Vec<String>,
        line: usize,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            section_path,
            line,
            source_text: source_text.into(),
            validation: Validation::Unchecked,
            execution: Execution::NotRun,
        }
    }

    /// Top-level section name; the unit of scope sharing in the sandbox.
    pub fn top_section(&self) -> &str {
        self.section_path.first().map(String::as_str).unwrap_or("")
    }

    /// `section/label` form used in diagnostics and policy matching.
    pub fn qualified_label(&self) -> String {
        let mut parts: Vec<&str> = self.section_path.iter().map(String::as_str).collect();
        if parts.last().copied() != Some(self.label.as_str()) {
            parts.push(&self.label);
        }
        parts.join("/")
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.validation, Validation::Valid { .. })
    }

    /// The grammar goal the snippet validated under, if it validated.
    pub fn goal(&self) -> Option<SourceGoal> {
        match self.validation {
            Validation::Valid { goal } => Some(goal),
            _ => None,
        }
    }
}

/// Grammar goal a snippet parses under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceGoal {
    Script,
    Module,
}

/// Syntax validation verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Validation {
    Unchecked,
    Valid { goal: SourceGoal },
    SyntaxError { detail: SyntaxIssue },
}

/// Parse failure position, relative to the snippet (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxIssue {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// Execution outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Execution {
    NotRun,
    Success {
        output: SnippetOutput,
    },
    RuntimeError {
        detail: RuntimeFault,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        logs: Vec<LogLine>,
    },
    #[serde(rename_all = "camelCase")]
    TimedOut {
        after_ms: u64,
    },
}

impl Execution {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Execution::RuntimeError { .. } | Execution::TimedOut { .. })
    }

    /// Build a runtime error raised by the sandbox itself rather than by
    /// snippet code.
    pub fn fault(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Execution::RuntimeError {
            detail: RuntimeFault::new(kind, message),
            logs: Vec::new(),
        }
    }
}

/// Everything a successful snippet emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetOutput {
    #[serde(default)]
    pub logs: Vec<LogLine>,

    /// Completion value of the snippet, when representable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Error raised by a snippet that is configured as an expected failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_error: Option<RuntimeFault>,
}

/// Classified runtime error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeFault {
    /// Error classification, e.g. `TypeError`, `ReferenceError`, `Uncaught`.
    pub kind: String,
    pub message: String,
}

impl RuntimeFault {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RuntimeFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    pub fn parse(level: &str) -> Self {
        match level {
            "info" => LogLevel::Info,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Log,
        }
    }
}

/// One captured console line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record_is_unchecked_and_not_run() {
        let record = SnippetRecord::new("Loops", vec!["CONTROL FLOW".into(), "Loops".into()], 3, "x");
        assert_eq!(record.validation, Validation::Unchecked);
        assert_eq!(record.execution, Execution::NotRun);
        assert_eq!(record.top_section(), "CONTROL FLOW");
        assert_eq!(record.qualified_label(), "CONTROL FLOW/Loops");
    }

    #[test]
    fn test_qualified_label_with_ordinal() {
        let record = SnippetRecord::new("FUNCTIONS (2)", vec!["FUNCTIONS".into()], 1, "x");
        assert_eq!(record.qualified_label(), "FUNCTIONS/FUNCTIONS (2)");
    }

    #[test]
    fn test_record_serialization_shape() {
        let mut record = SnippetRecord::new("JSON", vec!["JSON".into()], 10, "JSON.parse('1')");
        record.validation = Validation::Valid {
            goal: SourceGoal::Script,
        };
        record.execution = Execution::Success {
            output: SnippetOutput {
                logs: vec![LogLine::new(LogLevel::Log, "hi")],
                value: Some(json!(1)),
                expected_error: None,
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sectionPath"], json!(["JSON"]));
        assert_eq!(value["source"], json!("JSON.parse('1')"));
        assert_eq!(value["validation"], json!({ "status": "valid", "goal": "script" }));
        assert_eq!(value["execution"]["status"], json!("success"));
        assert_eq!(value["execution"]["output"]["value"], json!(1));
        assert_eq!(
            value["execution"]["output"]["logs"],
            json!([{ "level": "log", "message": "hi" }])
        );
    }

    #[test]
    fn test_timed_out_serialization() {
        let value = serde_json::to_value(Execution::TimedOut { after_ms: 250 }).unwrap();
        assert_eq!(value, json!({ "status": "timed_out", "afterMs": 250 }));
    }

    #[test]
    fn test_syntax_error_round_trip() {
        let validation = Validation::SyntaxError {
            detail: SyntaxIssue {
                line: 2,
                column: 5,
                message: "abrupt end".into(),
            },
        };
        let text = serde_json::to_string(&validation).unwrap();
        let back: Validation = serde_json::from_str(&text).unwrap();
        assert_eq!(back, validation);
    }
}
