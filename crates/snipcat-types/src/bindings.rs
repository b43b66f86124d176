//! Stub host-environment bindings injected into every sandbox scope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stand-in for a host identifier that snippets may reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StubBinding {
    /// `console.log/info/warn/error/debug`, captured into the record.
    Console,

    /// `fetch(url)` resolving to a Response-like object.
    Fetch {
        #[serde(default = "default_fetch_status")]
        status: u16,
        #[serde(default = "default_fetch_body")]
        body: Value,
        /// When set, `fetch` rejects with a `TypeError` carrying this message.
        #[serde(default)]
        reject_with: Option<String>,
    },

    /// In-memory `document` with a small element tree.
    Document,

    /// `setTimeout`/`clearTimeout`, callbacks run as microtasks.
    Timers,

    /// An arbitrary JSON value bound to a global name.
    Global { name: String, value: Value },
}

fn default_fetch_status() -> u16 {
    200
}

fn default_fetch_body() -> Value {
    Value::Object(Default::default())
}

impl StubBinding {
    /// Global identifiers this binding defines.
    pub fn identifiers(&self) -> Vec<&str> {
        match self {
            StubBinding::Console => vec!["console"],
            StubBinding::Fetch { .. } => vec!["fetch"],
            StubBinding::Document => vec!["document"],
            StubBinding::Timers => vec!["setTimeout", "clearTimeout"],
            StubBinding::Global { name, .. } => vec![name.as_str()],
        }
    }

    pub fn default_set() -> Vec<StubBinding> {
        vec![
            StubBinding::Console,
            StubBinding::Fetch {
                status: default_fetch_status(),
                body: default_fetch_body(),
                reject_with: None,
            },
            StubBinding::Document,
            StubBinding::Timers,
        ]
    }
}
