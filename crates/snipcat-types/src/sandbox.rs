use crate::record::{Execution, SourceGoal};

// ================================
// CodeSandbox Trait
// ================================

/// Snippet sandbox interface
///
/// A sandbox hands out isolated scopes. Snippets run in one scope share
/// declarations; different scopes share nothing.
#[async_trait::async_trait]
pub trait CodeSandbox: Send + Sync {
    /// Open a fresh, empty scope seeded with the configured stub bindings.
    async fn open_scope(&self) -> Result<Box<dyn SandboxScope>, SandboxError>;
}

/// A live evaluation scope.
///
/// Dropping a scope tears it down. A `run` future that is dropped before it
/// resolves leaves the scope in an unknown state; callers must discard the
/// scope afterwards.
#[async_trait::async_trait]
pub trait SandboxScope: Send {
    /// Execute one snippet and report its outcome.
    ///
    /// Errors raised by snippet code are returned as
    /// `Ok(Execution::RuntimeError { .. })`; `Err` is reserved for failures
    /// of the scope itself.
    async fn run(&mut self, request: SnippetRequest) -> Result<Execution, SandboxError>;
}

/// Snippet execution request
#[derive(Debug, Clone)]
pub struct SnippetRequest {
    /// Code
    pub code: String,

    /// Grammar goal established by validation
    pub goal: SourceGoal,
}

/// Sandbox infrastructure errors
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Failed to start scope: {0}")]
    ScopeStartFailed(String),

    #[error("Scope closed")]
    ScopeClosed,
}
