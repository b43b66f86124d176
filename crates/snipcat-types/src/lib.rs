pub mod bindings;
pub mod record;
pub mod sandbox;

pub use bindings::StubBinding;
pub use record::{
    Execution, LogLevel, LogLine, RuntimeFault, SnippetOutput, SnippetRecord, SourceGoal,
    SyntaxIssue, Validation,
};
pub use sandbox::{CodeSandbox, SandboxError, SandboxScope, SnippetRequest};
