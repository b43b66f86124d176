//! Built-in JavaScript sandbox implementation using boa_engine.
//!
//! Provides isolated evaluation scopes with:
//! - Stub host bindings (console, fetch, document, timers, plain values)
//! - Resource limits (code size, output size, loop iterations, recursion)
//! - Console capture and completion-value rendering per snippet
//!
//! Wall-clock timeouts are enforced by the caller around
//! [`SandboxScope::run`]; a scope that misses its deadline is dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use snipcat_types::{CodeSandbox, SandboxError, SandboxScope, StubBinding};

use crate::scope::JsScope;

/// Built-in sandbox configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsSandboxConfig {
    /// Max snippet length (bytes)
    pub max_code_length: usize,

    /// Max console text plus rendered completion value (bytes)
    pub max_output_bytes: usize,

    /// Engine loop iteration limit; stops abandoned runaway loops
    pub loop_iteration_limit: Option<u64>,

    /// Engine recursion limit
    pub recursion_limit: Option<usize>,

    /// Host identifiers provided to every scope
    pub bindings: Vec<StubBinding>,
}

impl Default for JsSandboxConfig {
    fn default() -> Self {
        Self {
            max_code_length: 64 * 1024,
            max_output_bytes: 1024 * 1024,
            loop_iteration_limit: Some(100_000_000),
            recursion_limit: None,
            bindings: StubBinding::default_set(),
        }
    }
}

/// Built-in JavaScript sandbox using boa_engine
pub struct JsSandbox {
    config: JsSandboxConfig,
    next_scope_id: AtomicU64,
}

impl JsSandbox {
    pub fn new(config: JsSandboxConfig) -> Self {
        Self {
            config,
            next_scope_id: AtomicU64::new(1),
        }
    }
}

impl Default for JsSandbox {
    fn default() -> Self {
        Self::new(JsSandboxConfig::default())
    }
}

#[async_trait::async_trait]
impl CodeSandbox for JsSandbox {
    async fn open_scope(&self) -> Result<Box<dyn SandboxScope>, SandboxError> {
        let id = self.next_scope_id.fetch_add(1, Ordering::Relaxed);
        let scope = JsScope::spawn(id, self.config.clone()).await?;
        tracing::debug!(scope = scope.id(), "opened sandbox scope");
        Ok(Box::new(scope))
    }
}

// ================================
// Tests
// ================================
