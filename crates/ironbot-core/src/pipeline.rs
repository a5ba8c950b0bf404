//! Step definitions.
//!
//! A run is an ordered list of steps. Most are known when the builder is
//! configured; package builds are only discovered while the run executes
//! and get injected by the `ExpandPackages` step.

use crate::ids::UnitId;
use crate::trigger::NotificationRequest;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command every generated package step runs from inside its unit directory.
pub const PACKAGE_BUILD_COMMAND: &str = "../docker-build";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Checkout(CheckoutStep),
    Shell(ExecutionStep),
    Notify(NotificationRequest),
    ExpandPackages(ExpandStep),
}

impl Step {
    pub fn name(&self) -> &str {
        match self {
            Step::Checkout(s) => &s.name,
            Step::Shell(s) => &s.name,
            Step::Notify(s) => &s.name,
            Step::ExpandPackages(s) => &s.name,
        }
    }

    /// Whether a failure of this step stops the rest of the run.
    pub fn halt_on_failure(&self) -> bool {
        match self {
            Step::Checkout(s) => s.halt_on_failure,
            Step::Shell(s) => s.halt_on_failure,
            Step::Notify(_) => false,
            Step::ExpandPackages(_) => true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Step::Checkout(_) => "checkout",
            Step::Shell(_) => "shell",
            Step::Notify(_) => "notify",
            Step::ExpandPackages(_) => "expand",
        }
    }
}

impl From<ExecutionStep> for Step {
    fn from(step: ExecutionStep) -> Self {
        Step::Shell(step)
    }
}

impl From<NotificationRequest> for Step {
    fn from(request: NotificationRequest) -> Self {
        Step::Notify(request)
    }
}

/// A shell-style command run with an optional working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionStep {
    pub name: String,
    pub command: Vec<String>,
    #[serde(default)]
    pub workdir: Option<PathBuf>,
    #[serde(default)]
    pub halt_on_failure: bool,
}

impl ExecutionStep {
    pub fn new<I, S>(name: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            command: command.into_iter().map(Into::into).collect(),
            workdir: None,
            halt_on_failure: false,
        }
    }

    pub fn workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn halt_on_failure(mut self) -> Self {
        self.halt_on_failure = true;
        self
    }

    /// Build step for one package: `../docker-build` inside `<workdir>/<unit>`.
    pub fn package_build(unit: &UnitId, workdir: &Path) -> Self {
        Self::new(format!("build {}", unit), [PACKAGE_BUILD_COMMAND])
            .workdir(workdir.join(unit.as_str()))
            .halt_on_failure()
    }

    /// Command line as it would be typed in a shell, for display.
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

/// How an existing checkout is refreshed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// Update the existing working copy in place.
    #[default]
    Incremental,
    /// Remove the working copy and clone again.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckoutStep {
    pub name: String,
    pub repository: String,
    pub branch: String,
    #[serde(default)]
    pub codebase: Option<String>,
    #[serde(default)]
    pub mode: CheckoutMode,
    #[serde(default = "default_true")]
    pub submodules: bool,
    #[serde(default = "default_true")]
    pub shallow: bool,
    /// Defaults to true: a failed checkout stops the run.
    #[serde(default = "default_true")]
    pub halt_on_failure: bool,
}

fn default_true() -> bool {
    true
}

impl CheckoutStep {
    pub fn sources(repository: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            name: "checkout sources".to_string(),
            repository: repository.into(),
            branch: branch.into(),
            codebase: None,
            mode: CheckoutMode::Incremental,
            submodules: true,
            shallow: true,
            halt_on_failure: true,
        }
    }
}

/// The step that reads the manifest and injects one build per package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExpandStep {
    pub name: String,
    /// Directory the generated package steps run under.
    pub workdir: PathBuf,
    /// Manifest file name, relative to `workdir`.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

fn default_manifest() -> String {
    crate::manifest::MANIFEST_FILENAME.to_string()
}

impl ExpandStep {
    pub fn new(name: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            workdir: workdir.into(),
            manifest: default_manifest(),
        }
    }
}
