//! The build worker.

use crate::config::CiConfig;
use crate::executor::RunExecutor;
use ironbot_core::pipeline::Step;
use ironbot_core::run::{BuildContext, BuildProperties, RunSummary};
use ironbot_core::trigger::TriggerTarget;
use ironbot_core::{Error, Result};
use ironbot_notify::HttpTriggerSender;
use ironbot_runner::{GitCheckout, RunnerConfig, ShellRunner, WorkerFiles};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Runs configured builders on this worker.
///
/// Any number of runs may be in flight at once, up to the configured limit;
/// each owns its step queue and only shares the trigger catalog.
pub struct BuildAgent {
    config: CiConfig,
    catalog: Arc<[TriggerTarget]>,
    executor: RunExecutor,
    run_slots: Arc<Semaphore>,
}

impl BuildAgent {
    /// Create an agent wired to the shell, git and the registry.
    pub fn new(config: CiConfig) -> Self {
        let runner_config = RunnerConfig {
            timeout_seconds: (config.command_timeout_secs > 0)
                .then_some(config.command_timeout_secs),
            ..RunnerConfig::default()
        };
        let executor = RunExecutor::new(
            Arc::new(ShellRunner::new(runner_config.clone())),
            Arc::new(GitCheckout::new(ShellRunner::new(runner_config))),
            Arc::new(HttpTriggerSender::new(config.notify_timeout_secs)),
        );
        Self::with_executor(config, executor)
    }

    /// Create an agent around an existing executor.
    pub fn with_executor(config: CiConfig, executor: RunExecutor) -> Self {
        let run_slots = Arc::new(Semaphore::new(config.max_concurrent_runs.max(1) as usize));
        Self {
            catalog: config.catalog(),
            config,
            executor,
            run_slots,
        }
    }

    pub fn config(&self) -> &CiConfig {
        &self.config
    }

    /// Steps a run of `builder` would start with, before any expansion.
    pub fn plan(&self, builder: &str, props: &BuildProperties) -> Result<Vec<Step>> {
        let builder = self.config.builder(builder)?;
        let factory = self.config.factory(builder, Arc::clone(&self.catalog));
        Ok(factory.steps(props))
    }

    /// Run `builder` to completion.
    ///
    /// Fails only when the builder is unknown; step failures are reported in
    /// the returned summary.
    pub async fn run_builder(&self, builder: &str, props: BuildProperties) -> Result<RunSummary> {
        let steps = self.plan(builder, &props)?;
        let workdir = self.config.builder(builder)?.workdir.clone();

        let _permit = self
            .run_slots
            .acquire()
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        let mut ctx = BuildContext::new(builder, self.config.builddir(builder));
        ctx.workdir = workdir;
        ctx.properties = props;
        debug!(run_id = %ctx.run_id, builddir = %ctx.builddir.display(), "Acquired run slot");
        info!(
            run_id = %ctx.run_id,
            builder = %builder,
            repository = %ctx.properties.repository,
            branch = %ctx.properties.branch,
            "Run requested"
        );

        let files = WorkerFiles::new(&ctx.builddir);
        Ok(self.executor.execute(&ctx, &files, steps).await)
    }
}
