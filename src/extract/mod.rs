//! Snippet extraction: raw document text → ordered [`SnippetRecord`]s.
//!
//! The document is read as blank-line separated paragraphs. A paragraph
//! whose first meaningful line is a heading comment opens a section; the
//! rest of the paragraph, and every following paragraph until the next
//! heading, are statement groups labeled after that heading.

mod paragraphs;

use regex::Regex;
use snipcat_types::SnippetRecord;

use crate::config::ExtractConfig;
use crate::error::CatalogueError;

use paragraphs::{Paragraph, Paragraphs};

/// Compiled heading recognition rules.
#[derive(Debug, Clone)]
pub struct HeadingRules {
    comment_prefix: String,
    levels: Vec<Regex>,
    rule: Regex,
}

impl HeadingRules {
    pub fn new(comment_prefix: impl Into<String>, levels: Vec<Regex>, rule: Regex) -> Self {
        Self {
            comment_prefix: comment_prefix.into(),
            levels,
            rule,
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Result<Self, CatalogueError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| CatalogueError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        };
        let levels = config
            .heading_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        if levels.is_empty() {
            return Err(CatalogueError::InvalidPattern {
                pattern: String::new(),
                reason: "at least one heading pattern is required".to_string(),
            });
        }
        let rule = compile(&config.rule_pattern)?;
        Ok(Self::new(config.comment_prefix.clone(), levels, rule))
    }

    /// Comment text of a whole-line comment, trimmed.
    fn comment_text<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.trim_start()
            .strip_prefix(self.comment_prefix.as_str())
            .map(str::trim)
    }

    fn is_comment(&self, line: &str) -> bool {
        self.comment_text(line).is_some()
    }

    fn is_decorative(&self, line: &str) -> bool {
        self.comment_text(line)
            .map(|text| text.is_empty() || self.rule.is_match(text))
            .unwrap_or(false)
    }

    /// Heading depth and text for a heading line.
    fn heading<'a>(&self, line: &'a str) -> Option<(usize, &'a str)> {
        let text = self.comment_text(line)?;
        if text.is_empty() {
            return None;
        }
        self.levels
            .iter()
            .position(|re| re.is_match(text))
            .map(|level| (level, text))
    }

    /// Split a paragraph into its optional heading and its statement lines.
    fn split<'p, 'a>(
        &self,
        paragraph: &'p Paragraph<'a>,
    ) -> (Option<(usize, &'a str)>, &'p [(usize, &'a str)]) {
        let lines = paragraph.lines.as_slice();
        let Some(first) = lines.iter().position(|(_, l)| !self.is_decorative(l)) else {
            return (None, &[]);
        };
        match self.heading(lines[first].1) {
            Some(heading) => (Some(heading), &lines[first + 1..]),
            None => (None, &lines[first..]),
        }
    }
}

/// Lazy iterator over the snippets of one document.
pub struct Snippets<'a> {
    paragraphs: Paragraphs<'a>,
    rules: &'a HeadingRules,
    path: Vec<String>,
    heading: Option<String>,
    groups: usize,
}

impl<'a> Iterator for Snippets<'a> {
    type Item = SnippetRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for paragraph in self.paragraphs.by_ref() {
            let (heading, body) = self.rules.split(&paragraph);

            if let Some((level, text)) = heading {
                self.path.truncate(level);
                self.path.push(text.to_string());
                self.heading = Some(text.to_string());
                self.groups = 0;
            }

            // Comment-only groups are documentation, not snippets.
            if body.iter().all(|(_, l)| self.rules.is_comment(l)) {
                continue;
            }
            let Some(heading) = self.heading.as_deref() else {
                tracing::debug!(line = body[0].0, "skipping statements before the first heading");
                continue;
            };

            self.groups += 1;
            let label = if self.groups == 1 {
                heading.to_string()
            } else {
                format!("{} ({})", heading, self.groups)
            };
            let source = body.iter().map(|(_, l)| *l).collect::<Vec<_>>().join("\n");
            return Some(SnippetRecord::new(label, self.path.clone(), body[0].0, source));
        }
        None
    }
}

/// Extract every snippet of `text`, lazily.
///
/// Fails with [`CatalogueError::MalformedDocument`] only when the document
/// has no recognizable heading at all.
pub fn extract<'a>(text: &'a str, rules: &'a HeadingRules) -> Result<Snippets<'a>, CatalogueError> {
    let has_heading = Paragraphs::new(text).any(|p| rules.split(&p).0.is_some());
    if !has_heading {
        return Err(CatalogueError::MalformedDocument(
            "no section heading found".to_string(),
        ));
    }
    Ok(Snippets {
        paragraphs: Paragraphs::new(text),
        rules,
        path: Vec::new(),
        heading: None,
        groups: 0,
    })
}
