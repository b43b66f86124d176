/// A run of non-blank lines with their 1-based line numbers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Paragraph<'a> {
    pub lines: Vec<(usize, &'a str)>,
}

/// Blank-line separated paragraphs of a document.
pub(crate) struct Paragraphs<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Paragraphs<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }
}

impl<'a> Iterator for Paragraphs<'a> {
    type Item = Paragraph<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut lines = Vec::new();
        for (index, line) in self.lines.by_ref() {
            if line.trim().is_empty() {
                if lines.is_empty() {
                    continue;
                }
                break;
            }
            lines.push((index + 1, line));
        }
        if lines.is_empty() {
            None
        } else {
            Some(Paragraph { lines })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_blank_lines() {
        let paragraphs: Vec<_> = Paragraphs::new("a\nb\n\n\n  \nc\n").collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].lines, vec![(1, "a"), (2, "b")]);
        assert_eq!(paragraphs[1].lines, vec![(6, "c")]);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(Paragraphs::new("\n\n").count(), 0);
    }
}
