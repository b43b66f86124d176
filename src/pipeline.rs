//! The linear pipeline: extract → validate → execute → catalogue.

use std::sync::Arc;

use snipcat_sandbox_js::JsSandbox;
use snipcat_types::CodeSandbox;

use crate::catalogue::{Catalogue, CatalogueBuilder};
use crate::config::PipelineConfig;
use crate::error::CatalogueResult;
use crate::extract::{extract, HeadingRules};
use crate::sandbox::SnippetRunner;
use crate::validate::SyntaxValidator;

/// A configured pipeline, reusable across documents.
pub struct Pipeline {
    rules: HeadingRules,
    validator: SyntaxValidator,
    runner: SnippetRunner,
}

impl Pipeline {
    /// Pipeline backed by the built-in JavaScript sandbox.
    pub fn new(config: &PipelineConfig) -> CatalogueResult<Self> {
        let sandbox = Arc::new(JsSandbox::new(config.sandbox.engine.clone()));
        Self::with_sandbox(config, sandbox)
    }

    pub fn with_sandbox(config: &PipelineConfig, sandbox: Arc<dyn CodeSandbox>) -> CatalogueResult<Self> {
        Ok(Self {
            rules: HeadingRules::from_config(&config.extract)?,
            validator: SyntaxValidator::new(&config.validate),
            runner: SnippetRunner::new(sandbox, &config.sandbox, &config.policy),
        })
    }

    /// Build the catalogue for one document.
    pub async fn run(&self, text: &str) -> CatalogueResult<Catalogue> {
        let records: Vec<_> = extract(text, &self.rules)?
            .map(|record| self.validator.validate(record))
            .collect();
        CatalogueBuilder::check_unique(&records)?;

        let invalid = records.iter().filter(|r| !r.is_valid()).count();
        tracing::info!(snippets = records.len(), syntax_errors = invalid, "validated snippets");

        let records = self.runner.run_all(records).await;

        let mut builder = CatalogueBuilder::new();
        builder.extend(records)?;
        let catalogue = builder.build();
        tracing::info!(summary = %catalogue.summary(), "catalogue built");
        Ok(catalogue)
    }
}

/// Run the whole pipeline once with `config`.
pub async fn run_pipeline(text: &str, config: &PipelineConfig) -> CatalogueResult<Catalogue> {
    Pipeline::new(config)?.run(text).await
}
