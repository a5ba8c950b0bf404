//! Run execution.
//!
//! Drives one run's step queue to completion: steps execute strictly one
//! after another, and a failing step that halts on failure skips everything
//! still queued behind it.

use chrono::Utc;
use ironbot_core::{Error, Result};
use ironbot_core::pipeline::Step;
use ironbot_core::ports::{CommandRunner, ManifestSource, NotificationSender, SourceCheckout};
use ironbot_core::run::{BuildContext, RunStatus, RunSummary, StepRecord, StepStatus};
use ironbot_scheduler::{PackageExpander, StepQueue};
use std::sync::Arc;
use tracing::{error, info, warn};

/// How a step ended when it did not error out.
struct StepOutcome {
    success: bool,
    exit_code: Option<i32>,
}

impl StepOutcome {
    fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: None,
        }
    }
}

/// Executes runs against the worker's adapters.
pub struct RunExecutor {
    commands: Arc<dyn CommandRunner>,
    checkout: Arc<dyn SourceCheckout>,
    notifier: Arc<dyn NotificationSender>,
    expander: PackageExpander,
}

impl RunExecutor {
    pub fn new(
        commands: Arc<dyn CommandRunner>,
        checkout: Arc<dyn SourceCheckout>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            commands,
            checkout,
            notifier,
            expander: PackageExpander::new(),
        }
    }

    /// Run `steps` for the build described by `ctx`.
    ///
    /// Manifests requested by expansion steps are read from `source`.
    pub async fn execute(
        &self,
        ctx: &BuildContext,
        source: &dyn ManifestSource,
        steps: Vec<Step>,
    ) -> RunSummary {
        let started_at = Utc::now();
        let start = std::time::Instant::now();
        let mut queue = StepQueue::new(steps);
        let mut records = Vec::new();
        let mut status = RunStatus::Success;

        info!(
            run_id = %ctx.run_id,
            builder = %ctx.builder,
            steps = queue.len(),
            "Starting run"
        );

        while let Some(step) = queue.start_next() {
            let step_started = Utc::now();
            let step_start = std::time::Instant::now();

            info!(run_id = %ctx.run_id, step = %step.name(), kind = step.kind(), "Executing step");
            let outcome = self.execute_step(&step, ctx, source, &mut queue).await;
            queue.finish_current();

            let mut record = StepRecord {
                name: step.name().to_string(),
                kind: step.kind().to_string(),
                status: StepStatus::Success,
                exit_code: None,
                error: None,
                started_at: Some(step_started),
                duration_ms: Some(step_start.elapsed().as_millis() as u64),
            };

            let failed = match outcome {
                Ok(outcome) => {
                    record.exit_code = outcome.exit_code;
                    if !outcome.success {
                        let failure = Error::StepFailed {
                            exit_code: outcome.exit_code.unwrap_or(-1),
                            message: step.name().to_string(),
                        };
                        record.error = Some(failure.to_string());
                    }
                    !outcome.success
                }
                Err(e) => {
                    record.error = Some(e.to_string());
                    true
                }
            };

            if failed && step.halt_on_failure() {
                error!(
                    run_id = %ctx.run_id,
                    step = %step.name(),
                    exit_code = ?record.exit_code,
                    error = ?record.error,
                    "Step failed, halting run"
                );
                record.status = StepStatus::Failure;
                records.push(record);
                status = RunStatus::Failure;
                records.extend(
                    queue
                        .terminate()
                        .iter()
                        .map(|s| StepRecord::skipped(s.name(), s.kind())),
                );
                break;
            }

            if failed {
                warn!(
                    run_id = %ctx.run_id,
                    step = %step.name(),
                    exit_code = ?record.exit_code,
                    error = ?record.error,
                    "Step failed, continuing"
                );
                record.status = StepStatus::Warnings;
            }
            records.push(record);
        }

        let summary = RunSummary {
            run_id: ctx.run_id,
            builder: ctx.builder.clone(),
            status,
            steps: records,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            run_id = %ctx.run_id,
            status = ?summary.status,
            warnings = summary.warnings(),
            duration_ms = summary.duration_ms,
            "Run finished"
        );
        summary
    }

    async fn execute_step(
        &self,
        step: &Step,
        ctx: &BuildContext,
        source: &dyn ManifestSource,
        queue: &mut StepQueue,
    ) -> Result<StepOutcome> {
        match step {
            Step::Checkout(checkout) => {
                let result = self.checkout.checkout(checkout, &ctx.resolve(None)).await?;
                Ok(StepOutcome {
                    success: result.success,
                    exit_code: Some(result.exit_code),
                })
            }
            Step::Shell(shell) => {
                let dir = ctx.resolve(shell.workdir.as_deref());
                let result = self.commands.run(shell, &dir).await?;
                Ok(StepOutcome {
                    success: result.success,
                    exit_code: Some(result.exit_code),
                })
            }
            Step::Notify(request) => {
                self.notifier.send(request).await?;
                Ok(StepOutcome::succeeded())
            }
            Step::ExpandPackages(expand) => {
                self.expander.run(expand, source, queue).await?;
                Ok(StepOutcome::succeeded())
            }
        }
    }
}
