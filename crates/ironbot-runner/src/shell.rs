//! Command execution on the worker host.

use crate::runner::{OutputLine, OutputSink, OutputStream, RunnerConfig};
use async_trait::async_trait;
use ironbot_core::pipeline::ExecutionStep;
use ironbot_core::ports::{CommandResult, CommandRunner};
use ironbot_core::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};

/// Runs step commands as child processes, one at a time.
pub struct ShellRunner {
    config: RunnerConfig,
    output: OutputSink,
}

impl ShellRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            output: None,
        }
    }

    /// Stream command output to `tx` instead of the log.
    pub fn with_output(mut self, tx: mpsc::Sender<OutputLine>) -> Self {
        self.output = Some(tx);
        self
    }

    /// Run an argv command in `dir` and wait for it.
    pub async fn execute_command(&self, command: &[String], dir: &Path) -> Result<CommandResult> {
        let start = std::time::Instant::now();
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Internal("Empty command".to_string()))?;

        info!(command = %command.join(" "), workdir = %dir.display(), "Executing command");

        tokio::fs::create_dir_all(dir).await?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Internal(format!("Failed to spawn {}: {}", program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Internal("stderr not captured".to_string()))?;

        let stdout_handle = tokio::spawn(forward_lines(
            stdout,
            OutputStream::Stdout,
            self.output.clone(),
        ));
        let stderr_handle = tokio::spawn(forward_lines(
            stderr,
            OutputStream::Stderr,
            self.output.clone(),
        ));

        let wait_result = if let Some(timeout_secs) = self.config.timeout_seconds {
            match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_secs, "Command timed out, killing process");
                    let _ = child.kill().await;
                    return Err(Error::StepTimeout {
                        seconds: timeout_secs,
                    });
                }
            }
        } else {
            child.wait().await
        };

        let _ = stdout_handle.await;
        let _ = stderr_handle.await;

        let status = wait_result
            .map_err(|e| Error::Internal(format!("Failed to wait for process: {}", e)))?;

        let exit_code = status.code().unwrap_or(-1);
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(exit_code, duration_ms, "Command completed");

        Ok(CommandResult::from_exit_code(exit_code, duration_ms))
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

async fn forward_lines<R>(reader: R, stream: OutputStream, sink: OutputSink)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut line_number = 0u32;

    while let Ok(Some(line)) = lines.next_line().await {
        line_number += 1;
        match &sink {
            Some(tx) => {
                let output = OutputLine {
                    stream,
                    content: line,
                    line_number,
                    timestamp: chrono::Utc::now(),
                };
                if tx.send(output).await.is_err() {
                    break;
                }
            }
            None => debug!(?stream, "{}", line),
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, step: &ExecutionStep, dir: &Path) -> Result<CommandResult> {
        let mut last_error = None;
        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                info!(attempt, step = %step.name, "Retrying command");
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }

            match self.execute_command(&step.command, dir).await {
                Ok(result) if result.success => return Ok(result),
                Ok(result) if attempt == self.config.retry_count => return Ok(result),
                Ok(_) => {
                    warn!(attempt, step = %step.name, "Command failed, will retry");
                }
                Err(e) if attempt == self.config.retry_count => {
                    error!(error = %e, step = %step.name, "Command failed after all retries");
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Command error, will retry");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Internal("Unknown error".to_string())))
    }
}
