//! Flatpak runtime and application builder.

use super::{BuildFactory, checkout_sources};
use ironbot_core::pipeline::{ExecutionStep, Step};
use ironbot_core::run::BuildProperties;
use std::path::PathBuf;

const BUILD_REPO: &str = "/build/repo";
const PRIVATE_KEY: &str = "/build/key.gpg";
const PUBLISHED_REPO: &str = "/flatpak/repo";
const PUBLISHED_FILES: &str = "/flatpak/files";

/// Signs and publishes a Flatpak runtime and its apps.
pub struct FlatpakFactory {
    metadata: String,
    gpg_key: String,
    workdir: PathBuf,
}

impl FlatpakFactory {
    pub fn new(metadata: impl Into<String>, gpg_key: impl Into<String>) -> Self {
        Self {
            metadata: metadata.into(),
            gpg_key: gpg_key.into(),
            workdir: PathBuf::from("build"),
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    fn flatpak_build(&self, name: &str, args: Vec<String>) -> Step {
        let command = ["sudo".to_string(), "./flatpak-build".to_string()]
            .into_iter()
            .chain(args);
        ExecutionStep::new(name, command)
            .workdir(&self.workdir)
            .halt_on_failure()
            .into()
    }

    fn build(&self, name: &str, kind: &str) -> Step {
        self.flatpak_build(
            name,
            vec![
                format!("--repo={}", BUILD_REPO),
                "build".to_string(),
                format!("--metadata={}", self.metadata),
                format!("--type={}", kind),
                format!("--gpg-key={}", self.gpg_key),
            ],
        )
    }

    fn files(&self, name: &str, kind: &str) -> Step {
        self.flatpak_build(
            name,
            vec![
                "files".to_string(),
                format!("--metadata={}", self.metadata),
                format!("--type={}", kind),
                format!("--gpg-key={}", self.gpg_key),
                format!("--dest={}", PUBLISHED_FILES),
            ],
        )
    }
}

impl BuildFactory for FlatpakFactory {
    fn kind(&self) -> &'static str {
        "flatpak"
    }

    fn steps(&self, props: &BuildProperties) -> Vec<Step> {
        let gpg = |name: &str, args: &[&str]| -> Step {
            ExecutionStep::new(name, ["sudo", "gpg"].iter().chain(args).copied())
                .workdir(&self.workdir)
                .halt_on_failure()
                .into()
        };

        vec![
            gpg("import private gpg key", &["--import", PRIVATE_KEY]),
            gpg("list gpg keys", &["--list-keys"]),
            checkout_sources(props),
            self.build("build runtime", "runtime"),
            self.flatpak_build(
                "export",
                vec!["export".to_string(), format!("--gpg-key={}", self.gpg_key)],
            ),
            self.build("build apps", "app"),
            self.flatpak_build(
                "synchronize to repo",
                vec!["sync".to_string(), format!("--dest={}", PUBLISHED_REPO)],
            ),
            self.files("create runtime files", "runtime"),
            self.files("create apps files", "app"),
        ]
    }
}
