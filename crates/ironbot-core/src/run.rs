//! Run and step outcome types.

use crate::ids::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    /// Failed, and the step halts the run.
    Failure,
    /// Failed, but the run carries on.
    Warnings,
    /// Never ran because an earlier step halted the run.
    Skipped,
}

/// Record of one executed (or skipped) step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub kind: String,
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl StepRecord {
    pub fn skipped(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            status: StepStatus::Skipped,
            exit_code: None,
            error: None,
            started_at: None,
            duration_ms: None,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub builder: String,
    pub status: RunStatus,
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    pub fn warnings(&self) -> usize {
        self.count(StepStatus::Warnings)
    }

    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Properties of the change that triggered the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProperties {
    pub repository: String,
    pub branch: String,
    #[serde(default)]
    pub codebase: Option<String>,
}

/// Where a run executes on the worker.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub run_id: RunId,
    pub builder: String,
    /// Per-builder directory on the worker; manifests are read from here.
    pub builddir: PathBuf,
    /// Default working directory of steps, relative to `builddir`.
    pub workdir: PathBuf,
    pub properties: BuildProperties,
}

impl BuildContext {
    pub fn new(builder: impl Into<String>, builddir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: RunId::new(),
            builder: builder.into(),
            builddir: builddir.into(),
            workdir: PathBuf::from("build"),
            properties: BuildProperties::default(),
        }
    }

    /// Absolute directory a step runs in.
    ///
    /// Relative step directories are taken from `builddir`; a step without a
    /// directory runs in the default working directory.
    pub fn resolve(&self, workdir: Option<&Path>) -> PathBuf {
        let dir = workdir.unwrap_or(&self.workdir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.builddir.join(dir)
        }
    }
}
