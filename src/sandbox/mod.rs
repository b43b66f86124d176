//! Snippet execution: section units, bounded concurrency and timeouts on
//! top of a [`CodeSandbox`](snipcat_types::CodeSandbox).

pub mod policy;
pub mod runner;

pub use policy::ExpectedFailures;
pub use runner::SnippetRunner;
