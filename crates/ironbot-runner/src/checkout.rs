//! Git source checkout.

use crate::shell::ShellRunner;
use async_trait::async_trait;
use ironbot_core::pipeline::{CheckoutMode, CheckoutStep};
use ironbot_core::ports::{CommandResult, SourceCheckout};
use ironbot_core::{Error, Result};
use std::path::Path;
use tracing::info;

/// Checks sources out with the `git` binary found on the worker.
pub struct GitCheckout {
    runner: ShellRunner,
}

impl GitCheckout {
    pub fn new(runner: ShellRunner) -> Self {
        Self { runner }
    }

    /// Commands that bring `dir` to the tip of the requested branch.
    fn plan(step: &CheckoutStep, has_working_copy: bool) -> Vec<Vec<String>> {
        let git = |args: &[&str]| -> Vec<String> {
            std::iter::once("git")
                .chain(args.iter().copied())
                .map(String::from)
                .collect()
        };
        let mut commands = Vec::new();

        if has_working_copy {
            let mut fetch = git(&["fetch"]);
            if step.shallow {
                fetch.extend(["--depth".to_string(), "1".to_string()]);
            }
            fetch.extend(["origin".to_string(), step.branch.clone()]);
            commands.push(fetch);
            commands.push(git(&["reset", "--hard", "FETCH_HEAD"]));
        } else {
            let mut clone = git(&["clone"]);
            if step.shallow {
                clone.extend(["--depth".to_string(), "1".to_string()]);
            }
            clone.extend([
                "--branch".to_string(),
                step.branch.clone(),
                step.repository.clone(),
                ".".to_string(),
            ]);
            commands.push(clone);
        }

        if step.submodules {
            let mut update = git(&["submodule", "update", "--init", "--recursive"]);
            if step.shallow {
                update.extend(["--depth".to_string(), "1".to_string()]);
            }
            commands.push(update);
        }

        commands
    }
}

impl Default for GitCheckout {
    fn default() -> Self {
        Self::new(ShellRunner::default())
    }
}

#[async_trait]
impl SourceCheckout for GitCheckout {
    async fn checkout(&self, step: &CheckoutStep, dir: &Path) -> Result<CommandResult> {
        if step.repository.is_empty() || step.branch.is_empty() {
            return Err(Error::Checkout(
                "repository and branch must be set".to_string(),
            ));
        }

        if step.mode == CheckoutMode::Full && tokio::fs::try_exists(dir).await? {
            tokio::fs::remove_dir_all(dir).await?;
        }
        let has_working_copy = tokio::fs::try_exists(dir.join(".git")).await?;

        info!(
            repository = %step.repository,
            branch = %step.branch,
            incremental = has_working_copy,
            "Checking out sources"
        );

        let mut total_ms = 0;
        for command in Self::plan(step, has_working_copy) {
            let result = self.runner.execute_command(&command, dir).await?;
            total_ms += result.duration_ms;
            if !result.success {
                return Ok(CommandResult {
                    duration_ms: total_ms,
                    ..result
                });
            }
        }

        Ok(CommandResult::from_exit_code(0, total_ms))
    }
}
