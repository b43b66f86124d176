//! Error types for the snippet catalogue pipeline.
//!
//! - [`CatalogueError`]: fatal errors that stop a run (malformed document,
//!   duplicate labels, I/O and configuration problems).
//!
//! Per-snippet failures (syntax errors, runtime errors, timeouts) are not
//! errors here; they are recorded on the catalogue entries.

pub mod catalogue_error;

pub use catalogue_error::CatalogueError;

/// Convenience alias for pipeline-level results.
pub type CatalogueResult<T> = Result<T, CatalogueError>;
