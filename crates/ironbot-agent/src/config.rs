//! Worker configuration.
//!
//! One YAML file describes the trigger catalog and every builder the
//! worker runs:
//!
//! ```yaml
//! worker_dir: /srv/ironbot/worker
//! triggers:
//!   - name: liridev/ci-archlinux
//!     token: 0f3c...
//!     tags: [packages]
//! builders:
//!   - name: archlinux-packages
//!     kind: arch_packages
//!     repository: https://github.com/lirios/archlinux-packages.git
//! ```

use ironbot_core::run::BuildProperties;
use ironbot_core::trigger::{DEFAULT_REGISTRY_URL, EndpointTemplate, TriggerTarget};
use ironbot_core::{Error, Result};
use ironbot_scheduler::{
    ArchIsoFactory, ArchPackagesFactory, BuildFactory, DockerHubFactory, FlatpakFactory,
    TriggerDispatcher,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CiConfig {
    /// Root under which every builder gets its own build directory.
    #[serde(default = "default_worker_dir")]
    pub worker_dir: PathBuf,
    /// Base URL of the registry receiving rebuild triggers.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_secs: u64,
    /// Kill commands running longer than this. Zero disables the limit.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// Maximum runs executing at once on this worker.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_runs: u32,
    #[serde(default)]
    pub triggers: Vec<TriggerTarget>,
    #[serde(default)]
    pub builders: Vec<BuilderConfig>,
}

fn default_worker_dir() -> PathBuf {
    PathBuf::from("/var/lib/ironbot/worker")
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_notify_timeout() -> u64 {
    30
}

fn default_command_timeout() -> u64 {
    4 * 3600
}

fn default_max_concurrent() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BuilderConfig {
    pub name: String,
    /// Repository checked out when a run does not name one.
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub codebase: Option<String>,
    /// Default working directory of steps, relative to the build directory.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    #[serde(flatten)]
    pub kind: BuilderKind,
}

fn default_branch() -> String {
    "develop".to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from("build")
}

fn default_retention_days() -> u32 {
    7
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuilderKind {
    ArchPackages,
    ArchIso {
        #[serde(default = "default_retention_days")]
        retention_days: u32,
    },
    DockerHub {
        tags: BTreeSet<String>,
    },
    Flatpak {
        metadata: String,
        gpg_key: String,
    },
}

impl BuilderConfig {
    /// Properties for a run, falling back to this builder's defaults.
    pub fn properties(
        &self,
        repository: Option<String>,
        branch: Option<String>,
        codebase: Option<String>,
    ) -> BuildProperties {
        BuildProperties {
            repository: repository
                .or_else(|| self.repository.clone())
                .unwrap_or_default(),
            branch: branch.unwrap_or_else(|| self.branch.clone()),
            codebase: codebase.or_else(|| self.codebase.clone()),
        }
    }
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            worker_dir: default_worker_dir(),
            registry_url: default_registry_url(),
            notify_timeout_secs: default_notify_timeout(),
            command_timeout_secs: default_command_timeout(),
            max_concurrent_runs: default_max_concurrent(),
            triggers: vec![],
            builders: vec![],
        }
    }
}

impl CiConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check what the type system can't: names, tokens and URLs.
    pub fn validate(&self) -> Result<()> {
        let registry = url::Url::parse(&self.registry_url)
            .map_err(|e| Error::Config(format!("registry_url {}: {}", self.registry_url, e)))?;
        if !matches!(registry.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "registry_url must be http(s), got {}",
                registry.scheme()
            )));
        }

        for target in &self.triggers {
            if target.name.is_empty() || target.token.is_empty() {
                return Err(Error::Config(
                    "every trigger needs a name and a token".to_string(),
                ));
            }
        }

        let mut seen = HashSet::new();
        for builder in &self.builders {
            if !seen.insert(builder.name.as_str()) {
                return Err(Error::Config(format!("duplicate builder: {}", builder.name)));
            }
            if let BuilderKind::DockerHub { tags } = &builder.kind
                && tags.is_empty()
            {
                return Err(Error::Config(format!(
                    "builder {} has no tags to trigger",
                    builder.name
                )));
            }
        }

        Ok(())
    }

    pub fn builder(&self, name: &str) -> Result<&BuilderConfig> {
        self.builders
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| Error::UnknownBuilder(name.to_string()))
    }

    /// The trigger catalog, shared read-only between runs.
    pub fn catalog(&self) -> Arc<[TriggerTarget]> {
        self.triggers.clone().into()
    }

    pub fn dispatcher(&self) -> TriggerDispatcher {
        TriggerDispatcher::new(EndpointTemplate::new(&self.registry_url))
    }

    /// Build directory of a builder on this worker.
    pub fn builddir(&self, builder: &str) -> PathBuf {
        self.worker_dir.join(builder)
    }

    /// Factory assembling the steps of `builder`.
    pub fn factory(
        &self,
        builder: &BuilderConfig,
        catalog: Arc<[TriggerTarget]>,
    ) -> Box<dyn BuildFactory> {
        let dispatcher = self.dispatcher();
        match &builder.kind {
            BuilderKind::ArchPackages => Box::new(
                ArchPackagesFactory::new(catalog, dispatcher).with_workdir(&builder.workdir),
            ),
            BuilderKind::ArchIso { retention_days } => {
                Box::new(ArchIsoFactory::new(*retention_days).with_workdir(&builder.workdir))
            }
            BuilderKind::DockerHub { tags } => {
                Box::new(DockerHubFactory::new(catalog, tags.clone(), dispatcher))
            }
            BuilderKind::Flatpak { metadata, gpg_key } => Box::new(
                FlatpakFactory::new(metadata.clone(), gpg_key.clone())
                    .with_workdir(&builder.workdir),
            ),
        }
    }
}
