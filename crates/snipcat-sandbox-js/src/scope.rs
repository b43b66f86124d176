//! Long-lived evaluation scope backed by a dedicated worker thread.
//!
//! A boa `Context` is not `Send`, so each scope owns one OS thread that
//! creates the context, installs the bindings and then serves `Run`
//! commands until it is shut down. Workers are plain detached threads: an
//! abandoned worker stuck in a runaway loop never blocks runtime shutdown and
//! exits on its own once the engine's loop limit stops the snippet.

use boa_engine::builtins::promise::PromiseState;
use boa_engine::{Context, JsError, JsNativeError, JsResult, JsValue, Module, Source};
use tokio::sync::{mpsc, oneshot};

use snipcat_types::{
    Execution, RuntimeFault, SandboxError, SandboxScope, SnippetOutput, SnippetRequest, SourceGoal,
};

use crate::builtins::{self as js_builtins, ScopeHooks};
use crate::sandbox::JsSandboxConfig;

#[derive(Debug)]
struct RunInvoke {
    request: SnippetRequest,
    resp: oneshot::Sender<Execution>,
}

#[derive(Debug)]
enum ScopeCommand {
    Run(RunInvoke),
    Shutdown,
}

/// Handle to a scope worker.
#[derive(Debug)]
pub struct JsScope {
    id: u64,
    tx: mpsc::Sender<ScopeCommand>,
}

impl JsScope {
    pub(crate) async fn spawn(id: u64, config: JsSandboxConfig) -> Result<Self, SandboxError> {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<ScopeCommand>(8);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), String>>();

        std::thread::Builder::new()
            .name(format!("snipcat-scope-{}", id))
            .spawn(move || {
                let mut engine = match ScopeEngine::new(&config) {
                    Ok(engine) => {
                        let _ = ready_tx.send(Ok(()));
                        engine
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Some(cmd) = cmd_rx.blocking_recv() {
                    match cmd {
                        ScopeCommand::Run(inv) => {
                            let outcome = engine.execute(&inv.request);
                            let _ = inv.resp.send(outcome);
                        }
                        ScopeCommand::Shutdown => break,
                    }
                }
                tracing::trace!(scope = id, "scope worker exited");
            })
            .map_err(|e| SandboxError::ScopeStartFailed(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Self { id, tx: cmd_tx }),
            Ok(Err(msg)) => Err(SandboxError::ScopeStartFailed(msg)),
            Err(_) => Err(SandboxError::ScopeStartFailed(
                "scope worker exited during startup".to_string(),
            )),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[async_trait::async_trait]
impl SandboxScope for JsScope {
    async fn run(&mut self, request: SnippetRequest) -> Result<Execution, SandboxError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(ScopeCommand::Run(RunInvoke {
                request,
                resp: resp_tx,
            }))
            .await
            .map_err(|_| SandboxError::ScopeClosed)?;
        resp_rx.await.map_err(|_| SandboxError::ScopeClosed)
    }
}

impl Drop for JsScope {
    fn drop(&mut self) {
        let _ = self.tx.try_send(ScopeCommand::Shutdown);
    }
}

/// Thread-local half of a scope: the context and its hooks.
struct ScopeEngine {
    context: Context,
    hooks: ScopeHooks,
    config: JsSandboxConfig,
}

impl ScopeEngine {
    fn new(config: &JsSandboxConfig) -> Result<Self, String> {
        let mut context = Context::default();

        let limits = context.runtime_limits_mut();
        if let Some(limit) = config.loop_iteration_limit {
            limits.set_loop_iteration_limit(limit);
        }
        if let Some(limit) = config.recursion_limit {
            limits.set_recursion_limit(limit);
        }

        let hooks =
            js_builtins::register_all(&mut context, &config.bindings, config.max_output_bytes)
                .map_err(|e| format!("Failed to register bindings: {}", e))?;

        Ok(Self {
            context,
            hooks,
            config: config.clone(),
        })
    }

    fn execute(&mut self, request: &SnippetRequest) -> Execution {
        if request.code.len() > self.config.max_code_length {
            return Execution::fault(
                "CodeTooLarge",
                format!(
                    "max {} bytes, got {} bytes",
                    self.config.max_code_length,
                    request.code.len()
                ),
            );
        }

        let result = match request.goal {
            SourceGoal::Script => self.context.eval(Source::from_bytes(&request.code)),
            SourceGoal::Module => self.evaluate_module(&request.code),
        };
        // Settle promise callbacks queued by the snippet before collecting logs.
        self.context.run_jobs();
        let captured = js_builtins::drain_console(&mut self.context, &self.hooks);
        let log_bytes = captured.byte_len();
        let overflowed = captured.overflowed;
        let logs = captured.lines;

        match result {
            Ok(value) => {
                let value = js_builtins::render_value(&mut self.context, &self.hooks, &value);
                let value_bytes = value
                    .as_ref()
                    .and_then(|v| serde_json::to_vec(v).ok())
                    .map(|bytes| bytes.len())
                    .unwrap_or(0);
                let size = log_bytes + value_bytes;
                if overflowed || size > self.config.max_output_bytes {
                    let message = if overflowed {
                        format!(
                            "max {} bytes, console output exceeded the limit",
                            self.config.max_output_bytes
                        )
                    } else {
                        format!("max {} bytes, got {} bytes", self.config.max_output_bytes, size)
                    };
                    return Execution::RuntimeError {
                        detail: RuntimeFault::new("OutputTooLarge", message),
                        logs,
                    };
                }
                Execution::Success {
                    output: SnippetOutput {
                        logs,
                        value,
                        expected_error: None,
                    },
                }
            }
            Err(err) => Execution::RuntimeError {
                detail: classify_error(&err, &mut self.context),
                logs,
            },
        }
    }

    /// Link and evaluate a module-goal snippet. Module resolution is
    /// disabled, so any `import` rejects the evaluation promise.
    fn evaluate_module(&mut self, code: &str) -> JsResult<JsValue> {
        let module = Module::parse(Source::from_bytes(code), None, &mut self.context)?;
        let promise = module.load_link_evaluate(&mut self.context);
        self.context.run_jobs();

        match promise.state() {
            PromiseState::Fulfilled(_) => Ok(JsValue::undefined()),
            PromiseState::Rejected(reason) => Err(JsError::from_opaque(reason)),
            PromiseState::Pending => Err(JsNativeError::error()
                .with_message("module evaluation did not settle")
                .into()),
        }
    }
}

/// Map an engine error onto `{kind, message}`.
pub(crate) fn classify_error(err: &JsError, context: &mut Context) -> RuntimeFault {
    if let Ok(native) = err.try_native(context) {
        return RuntimeFault::new(native.kind.to_string(), native.message());
    }
    let message = err
        .as_opaque()
        .and_then(|v| v.as_string().map(|s| s.to_std_string_escaped()))
        .unwrap_or_else(|| err.to_string());
    RuntimeFault::new("Uncaught", message)
}
