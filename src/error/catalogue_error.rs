use thiserror::Error;

/// Pipeline-level errors
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    #[error("Duplicate label '{label}' in section '{section}'")]
    DuplicateLabel { label: String, section: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    ConfigParse(String),
    #[error("Invalid heading pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("Export error: {0}")]
    Export(String),
}

impl CatalogueError {
    /// Errors caused by the input document rather than the environment.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            CatalogueError::MalformedDocument(_) | CatalogueError::DuplicateLabel { .. }
        )
    }
}

impl From<serde_json::Error> for CatalogueError {
    fn from(e: serde_json::Error) -> Self {
        CatalogueError::Export(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_label_message_names_label_and_section() {
        let err = CatalogueError::DuplicateLabel {
            label: "Arrays".into(),
            section: "ARRAY METHODS".into(),
        };
        let text = err.to_string();
        assert!(text.contains("Arrays"));
        assert!(text.contains("ARRAY METHODS"));
        assert!(err.is_document_error());
    }

    #[test]
    fn test_io_error_is_not_document_error() {
        let err: CatalogueError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, CatalogueError::Io(_)));
        assert!(!err.is_document_error());
    }
}
