//! Section-unit execution.
//!
//! Valid records are grouped by top-level section. Each unit runs its
//! snippets in document order inside one sandbox scope; units run
//! concurrently, bounded by a semaphore. A snippet that exceeds the timeout
//! is recorded as timed out and its scope is replaced, so no state from the
//! abandoned execution is visible to the rest of the unit.

use std::sync::Arc;
use std::time::Duration;

use snipcat_types::{CodeSandbox, Execution, SandboxScope, SnippetRecord, SnippetRequest};
use tokio::sync::Semaphore;

use crate::config::{PolicyConfig, SandboxSection};

use super::policy::ExpectedFailures;

/// Runs validated records through a sandbox.
pub struct SnippetRunner {
    sandbox: Arc<dyn CodeSandbox>,
    timeout: Duration,
    max_workers: usize,
    policy: ExpectedFailures,
}

/// Snippets of one top-level section, with their catalogue positions.
struct Unit {
    section: String,
    jobs: Vec<Job>,
}

struct Job {
    index: usize,
    label: String,
    request: SnippetRequest,
}

impl SnippetRunner {
    pub fn new(sandbox: Arc<dyn CodeSandbox>, config: &SandboxSection, policy: &PolicyConfig) -> Self {
        Self {
            sandbox,
            timeout: Duration::from_millis(config.timeout_ms),
            max_workers: config.max_workers.max(1),
            policy: ExpectedFailures::new(policy.expected_failures.clone()),
        }
    }

    /// Execute every valid record and return all records in their original
    /// order. Records that failed validation stay `NotRun`.
    pub async fn run_all(&self, mut records: Vec<SnippetRecord>) -> Vec<SnippetRecord> {
        let units = group_units(&records);
        tracing::info!(
            units = units.len(),
            workers = self.max_workers,
            timeout_ms = self.timeout.as_millis() as u64,
            "executing snippets"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = Vec::with_capacity(units.len());

        for unit in units {
            let permit = semaphore.clone().acquire_owned().await;
            let sandbox = self.sandbox.clone();
            let timeout = self.timeout;
            let indices: Vec<usize> = unit.jobs.iter().map(|job| job.index).collect();
            let section = unit.section.clone();

            let task = tokio::spawn(async move {
                let outcomes = run_unit(sandbox, timeout, unit).await;
                drop(permit);
                outcomes
            });
            tasks.push((section, indices, task));
        }

        for (section, indices, task) in tasks {
            match task.await {
                Ok(outcomes) => {
                    for (index, execution) in outcomes {
                        let execution = self.policy.apply(&records[index], execution);
                        records[index].execution = execution;
                    }
                }
                Err(e) => {
                    tracing::warn!(section = %section, error = %e, "section unit aborted");
                    for index in indices {
                        records[index].execution =
                            Execution::fault("SandboxFault", format!("section unit aborted: {}", e));
                    }
                }
            }
        }
        records
    }
}

/// Group valid records by top-level section, in order of first appearance.
fn group_units(records: &[SnippetRecord]) -> Vec<Unit> {
    let mut units: Vec<Unit> = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let Some(goal) = record.goal() else {
            continue;
        };
        let job = Job {
            index,
            label: record.label.clone(),
            request: SnippetRequest {
                code: record.source_text.clone(),
                goal,
            },
        };
        match units.iter_mut().find(|u| u.section == record.top_section()) {
            Some(unit) => unit.jobs.push(job),
            None => units.push(Unit {
                section: record.top_section().to_string(),
                jobs: vec![job],
            }),
        }
    }
    units
}

async fn run_unit(
    sandbox: Arc<dyn CodeSandbox>,
    timeout: Duration,
    unit: Unit,
) -> Vec<(usize, Execution)> {
    let mut outcomes = Vec::with_capacity(unit.jobs.len());
    let mut scope: Option<Box<dyn SandboxScope>> = None;

    for Job { index, label, request } in unit.jobs {
        if scope.is_none() {
            match sandbox.open_scope().await {
                Ok(opened) => scope = Some(opened),
                Err(e) => {
                    tracing::warn!(section = %unit.section, error = %e, "failed to open scope");
                    outcomes.push((index, Execution::fault("SandboxFault", e.to_string())));
                    continue;
                }
            }
        }
        let Some(active) = scope.as_mut() else {
            continue;
        };

        let result = tokio::time::timeout(timeout, active.run(request)).await;
        let execution = match result {
            Ok(Ok(execution)) => execution,
            Ok(Err(e)) => {
                tracing::warn!(label = %label, error = %e, "scope failed; replacing it");
                scope = None;
                Execution::fault("SandboxFault", e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    label = %label,
                    timeout_ms = timeout.as_millis() as u64,
                    "snippet timed out; replacing scope"
                );
                scope = None;
                Execution::TimedOut {
                    after_ms: timeout.as_millis() as u64,
                }
            }
        };
        tracing::debug!(label = %label, section = %unit.section, "snippet finished");
        outcomes.push((index, execution));
    }
    outcomes
}
