use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::{Catalogue, CatalogueSummary};
use crate::error::{CatalogueError, CatalogueResult};
use snipcat_types::SnippetRecord;

/// Catalogue export formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// One JSON document: `{ "summary": ..., "records": [...] }`.
    #[default]
    Json,
    /// One JSON record per line, no summary.
    JsonLines,
}

#[derive(Serialize)]
struct CatalogueDocument<'a> {
    summary: CatalogueSummary,
    records: &'a [SnippetRecord],
}

impl Catalogue {
    /// Serialize into `writer`, preserving document order.
    pub fn write_to<W: Write>(&self, mut writer: W, format: ExportFormat) -> CatalogueResult<()> {
        match format {
            ExportFormat::Json => {
                let document = CatalogueDocument {
                    summary: self.summary(),
                    records: self.records(),
                };
                serde_json::to_writer_pretty(&mut writer, &document)?;
                writeln!(writer)?;
            }
            ExportFormat::JsonLines => {
                for record in self.records() {
                    serde_json::to_writer(&mut writer, record)?;
                    writeln!(writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn export(&self, format: ExportFormat) -> CatalogueResult<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, format)?;
        String::from_utf8(buffer).map_err(|e| CatalogueError::Export(e.to_string()))
    }

    /// Write the export to a file, replacing it.
    pub fn save(&self, path: &Path, format: ExportFormat) -> CatalogueResult<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file), format)?;
        tracing::info!(path = %path.display(), records = self.len(), "catalogue exported");
        Ok(())
    }
}
