use serde::{Deserialize, Serialize};
use snipcat_types::{Execution, SnippetRecord, Validation};

/// Outcome counts for a catalogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueSummary {
    pub total: usize,
    pub valid: usize,
    pub syntax_errors: usize,
    pub succeeded: usize,
    pub runtime_errors: usize,
    pub timed_out: usize,
    pub not_run: usize,
}

impl CatalogueSummary {
    pub fn from_records(records: &[SnippetRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.validation {
                Validation::Valid { .. } => summary.valid += 1,
                Validation::SyntaxError { .. } => summary.syntax_errors += 1,
                Validation::Unchecked => {}
            }
            match record.execution {
                Execution::NotRun => summary.not_run += 1,
                Execution::Success { .. } => summary.succeeded += 1,
                Execution::RuntimeError { .. } => summary.runtime_errors += 1,
                Execution::TimedOut { .. } => summary.timed_out += 1,
            }
        }
        summary
    }
}

impl std::fmt::Display for CatalogueSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} snippets: {} valid, {} syntax errors, {} succeeded, {} runtime errors, {} timed out",
            self.total,
            self.valid,
            self.syntax_errors,
            self.succeeded,
            self.runtime_errors,
            self.timed_out
        )
    }
}
