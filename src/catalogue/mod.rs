//! Catalogue assembly and queries.
//!
//! [`CatalogueBuilder`] accepts annotated records in document order and
//! rejects a second record with the same label in the same section path.
//! The resulting [`Catalogue`] is immutable.

mod export;
mod summary;

use std::collections::HashSet;

use snipcat_types::{Execution, SnippetRecord, Validation};

use crate::error::{CatalogueError, CatalogueResult};

pub use export::ExportFormat;
pub use summary::CatalogueSummary;

#[derive(Debug, Default)]
pub struct CatalogueBuilder {
    records: Vec<SnippetRecord>,
    seen: HashSet<(Vec<String>, String)>,
}

impl CatalogueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, enforcing label uniqueness within its section path.
    pub fn push(&mut self, record: SnippetRecord) -> CatalogueResult<()> {
        let key = (record.section_path.clone(), record.label.clone());
        if !self.seen.insert(key) {
            return Err(CatalogueError::DuplicateLabel {
                label: record.label,
                section: record.section_path.join("/"),
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn extend<I>(&mut self, records: I) -> CatalogueResult<()>
    where
        I: IntoIterator<Item = SnippetRecord>,
    {
        for record in records {
            self.push(record)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check label uniqueness without building, so a run can fail before
    /// any snippet executes.
    pub fn check_unique(records: &[SnippetRecord]) -> CatalogueResult<()> {
        let mut seen = HashSet::new();
        for record in records {
            if !seen.insert((&record.section_path, &record.label)) {
                return Err(CatalogueError::DuplicateLabel {
                    label: record.label.clone(),
                    section: record.section_path.join("/"),
                });
            }
        }
        Ok(())
    }

    pub fn build(self) -> Catalogue {
        Catalogue {
            records: self.records,
        }
    }
}

/// Ordered, immutable collection of annotated snippets.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogue {
    records: Vec<SnippetRecord>,
}

impl Catalogue {
    /// Build a catalogue from records already in document order.
    pub fn from_records<I>(records: I) -> CatalogueResult<Self>
    where
        I: IntoIterator<Item = SnippetRecord>,
    {
        let mut builder = CatalogueBuilder::new();
        builder.extend(records)?;
        Ok(builder.build())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SnippetRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[SnippetRecord] {
        &self.records
    }

    pub fn get(&self, section_path: &[&str], label: &str) -> Option<&SnippetRecord> {
        self.records.iter().find(|r| {
            r.label == label
                && r.section_path.len() == section_path.len()
                && r.section_path.iter().zip(section_path).all(|(a, b)| a == b)
        })
    }

    /// Records whose section path starts with `prefix`.
    pub fn section<'a>(&'a self, prefix: &'a [&'a str]) -> impl Iterator<Item = &'a SnippetRecord> + 'a {
        self.records.iter().filter(move |r| {
            r.section_path.len() >= prefix.len()
                && r.section_path.iter().zip(prefix).all(|(a, b)| a == b)
        })
    }

    /// Distinct top-level sections in document order.
    pub fn sections(&self) -> Vec<&str> {
        let mut sections: Vec<&str> = Vec::new();
        for record in &self.records {
            let top = record.top_section();
            if !sections.contains(&top) {
                sections.push(top);
            }
        }
        sections
    }

    /// Records that did not parse, raised, or timed out.
    pub fn failures(&self) -> impl Iterator<Item = &SnippetRecord> {
        self.records.iter().filter(|r| {
            matches!(r.validation, Validation::SyntaxError { .. }) || r.execution.is_terminal_failure()
        })
    }

    pub fn summary(&self) -> CatalogueSummary {
        CatalogueSummary::from_records(&self.records)
    }

    /// Equality on every field except the payload of successful executions.
    pub fn equivalent_ignoring_output(&self, other: &Catalogue) -> bool {
        self.records.len() == other.records.len()
            && self
                .records
                .iter()
                .zip(&other.records)
                .all(|(a, b)| same_ignoring_output(a, b))
    }
}

fn same_ignoring_output(a: &SnippetRecord, b: &SnippetRecord) -> bool {
    let execution_matches = match (&a.execution, &b.execution) {
        (Execution::Success { .. }, Execution::Success { .. }) => true,
        (x, y) => x == y,
    };
    a.label == b.label
        && a.section_path == b.section_path
        && a.line == b.line
        && a.source_text == b.source_text
        && a.validation == b.validation
        && execution_matches
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a SnippetRecord;
    type IntoIter = std::slice::Iter<'a, SnippetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
