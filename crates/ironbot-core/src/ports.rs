//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the core domain and the
//! adapters that touch the worker, the network, or version control.

use crate::pipeline::{CheckoutStep, ExecutionStep};
use crate::trigger::NotificationRequest;
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Read access to files a previous step left in the build directory.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch a file's raw content. `path` is relative to the build
    /// directory. `Ok(None)` means the file does not exist.
    async fn fetch(&self, path: &Path) -> Result<Option<Vec<u8>>>;
}

/// Result of running a command to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub success: bool,
    pub duration_ms: u64,
}

impl CommandResult {
    pub fn from_exit_code(exit_code: i32, duration_ms: u64) -> Self {
        Self {
            exit_code,
            success: exit_code == 0,
            duration_ms,
        }
    }
}

/// Executes shell-style steps on the worker.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `step.command` in `dir`.
    async fn run(&self, step: &ExecutionStep, dir: &Path) -> Result<CommandResult>;
}

/// Brings the sources of a build into a working directory.
#[async_trait]
pub trait SourceCheckout: Send + Sync {
    async fn checkout(&self, step: &CheckoutStep, dir: &Path) -> Result<CommandResult>;
}

/// Delivers rebuild notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, request: &NotificationRequest) -> Result<()>;
}
