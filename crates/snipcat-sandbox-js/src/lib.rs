pub mod builtins;
pub mod sandbox;
pub mod scope;

pub use sandbox::{JsSandbox, JsSandboxConfig};
pub use scope::JsScope;
