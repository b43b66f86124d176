//! # snipcat: labeled JavaScript snippet catalogue
//!
//! `snipcat` reads a documentation-as-code JavaScript cheatsheet (comment
//! headings followed by blank-line separated example groups) and turns it
//! into an ordered, queryable catalogue:
//!
//! - **Extraction**: headings become labels and section paths; each
//!   statement group becomes a [`SnippetRecord`].
//! - **Validation**: every snippet is parsed (script goal, optional module
//!   goal) without being executed.
//! - **Execution**: valid snippets run in boa_engine scopes, one scope per
//!   top-level section, with stub `console`/`fetch`/`document`/timer
//!   bindings and a per-snippet timeout.
//! - **Cataloguing**: labels are checked for uniqueness per section and the
//!   result can be exported as JSON or JSON Lines.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use snipcat::{run_pipeline, ExportFormat, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), snipcat::CatalogueError> {
//!     let text = std::fs::read_to_string("cheatsheet.js")?;
//!     let catalogue = run_pipeline(&text, &PipelineConfig::default()).await?;
//!     println!("{}", catalogue.summary());
//!     print!("{}", catalogue.export(ExportFormat::Json)?);
//!     Ok(())
//! }
//! ```

pub mod catalogue;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod sandbox;
pub mod validate;

pub use catalogue::{Catalogue, CatalogueBuilder, CatalogueSummary, ExportFormat};
pub use config::{load_config, parse_config, ConfigFormat, PipelineConfig};
pub use error::{CatalogueError, CatalogueResult};
pub use extract::{extract, HeadingRules};
pub use pipeline::{run_pipeline, Pipeline};
pub use sandbox::{ExpectedFailures, SnippetRunner};
pub use validate::SyntaxValidator;

pub use snipcat_sandbox_js::{JsSandbox, JsSandboxConfig};
pub use snipcat_types::{
    CodeSandbox, Execution, LogLevel, LogLine, RuntimeFault, SandboxError, SandboxScope,
    SnippetOutput, SnippetRecord, SourceGoal, StubBinding, SyntaxIssue, Validation,
};
