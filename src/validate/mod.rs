//! Parse-only syntax validation of snippets.
//!
//! Snippets are parsed with the engine's parser under the script goal and,
//! when module syntax is allowed, re-parsed under the module goal if the
//! script parse fails. Nothing is executed here.

use boa_engine::ast::scope::Scope;
use boa_engine::interner::Interner;
use boa_engine::parser::{Parser, Source};
use snipcat_types::{SnippetRecord, SourceGoal, SyntaxIssue, Validation};

use crate::config::ValidateConfig;

/// Stateless snippet parser.
#[derive(Debug, Clone)]
pub struct SyntaxValidator {
    allow_module_syntax: bool,
}

impl SyntaxValidator {
    pub fn new(config: &ValidateConfig) -> Self {
        Self {
            allow_module_syntax: config.allow_module_syntax,
        }
    }

    /// Verdict for one piece of source text.
    pub fn check(&self, code: &str) -> Validation {
        let script_issue = match parse(code, SourceGoal::Script) {
            Ok(()) => return Validation::Valid { goal: SourceGoal::Script },
            Err(issue) => issue,
        };
        if !self.allow_module_syntax {
            return Validation::SyntaxError { detail: script_issue };
        }
        match parse(code, SourceGoal::Module) {
            Ok(()) => Validation::Valid { goal: SourceGoal::Module },
            // Report whichever goal got further into the snippet.
            Err(module_issue)
                if (module_issue.line, module_issue.column)
                    > (script_issue.line, script_issue.column) =>
            {
                Validation::SyntaxError { detail: module_issue }
            }
            Err(_) => Validation::SyntaxError { detail: script_issue },
        }
    }

    /// Annotate a record. Records other than `Unchecked` pass through.
    pub fn validate(&self, mut record: SnippetRecord) -> SnippetRecord {
        if record.validation == Validation::Unchecked {
            record.validation = self.check(&record.source_text);
            if let Validation::SyntaxError { detail } = &record.validation {
                tracing::debug!(
                    label = %record.label,
                    line = detail.line,
                    column = detail.column,
                    "syntax error: {}",
                    detail.message
                );
            }
        }
        record
    }

    pub fn validate_all<I>(&self, records: I) -> Vec<SnippetRecord>
    where
        I: IntoIterator<Item = SnippetRecord>,
    {
        records.into_iter().map(|r| self.validate(r)).collect()
    }
}

fn parse(code: &str, goal: SourceGoal) -> Result<(), SyntaxIssue> {
    let mut interner = Interner::default();
    let mut parser = Parser::new(Source::from_bytes(code));
    let scope = Scope::new_global();
    let result = match goal {
        SourceGoal::Script => parser.parse_script(&scope, &mut interner).map(|_| ()),
        SourceGoal::Module => parser.parse_module(&scope, &mut interner).map(|_| ()),
    };
    result.map_err(|e| issue_from_message(e.to_string(), code))
}

/// Build an issue from a parser diagnostic. Diagnostics end with
/// `at line L, col C`; those without a position (abrupt end of input)
/// point just past the last character of the snippet.
fn issue_from_message(message: String, code: &str) -> SyntaxIssue {
    let (line, column) = diagnostic_position(&message).unwrap_or_else(|| end_position(code));
    SyntaxIssue {
        line,
        column,
        message,
    }
}

fn diagnostic_position(message: &str) -> Option<(u32, u32)> {
    let rest = &message[message.rfind("at line ")? + "at line ".len()..];
    let (line, rest) = leading_number(rest)?;
    let rest = rest.strip_prefix(", col")?;
    let rest = rest.strip_prefix("umn").unwrap_or(rest).trim_start();
    let (column, _) = leading_number(rest)?;
    Some((line, column))
}

fn leading_number(text: &str) -> Option<(u32, &str)> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}

fn end_position(code: &str) -> (u32, u32) {
    let line_count = code.lines().count().max(1);
    let last_len = code.lines().last().map(|l| l.chars().count()).unwrap_or(0);
    (line_count as u32, last_len as u32 + 1)
}
