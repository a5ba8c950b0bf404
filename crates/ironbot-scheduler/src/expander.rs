//! Dynamic package-build expansion.
//!
//! The package selection stage writes a manifest of changed packages into
//! the build directory. Only once it exists can the run know what to build,
//! so the expansion step reads it while the run executes and splices one
//! build step per package into the queue behind itself.

use crate::queue::StepQueue;
use ironbot_core::Manifest;
use ironbot_core::Result;
use ironbot_core::pipeline::{ExecutionStep, ExpandStep, Step};
use ironbot_core::ports::ManifestSource;
use std::path::Path;
use tracing::{debug, info};

pub struct PackageExpander;

impl PackageExpander {
    pub fn new() -> Self {
        Self
    }

    /// Build steps for the packages in `manifest`, dependencies first.
    ///
    /// The manifest lists dependents before their dependencies, so the
    /// `unstable` list is walked back to front.
    pub fn expand(&self, manifest: &Manifest, workdir: &Path) -> Vec<ExecutionStep> {
        manifest
            .build_order()
            .map(|unit| ExecutionStep::package_build(unit, workdir))
            .collect()
    }

    /// Read the manifest and inject the package builds behind the running step.
    ///
    /// The manifest is read from the step's working directory, next to the
    /// package directories it names. A missing manifest injects nothing. Malformed content fails before the
    /// queue is touched. Returns the number of injected steps.
    pub async fn run(
        &self,
        step: &ExpandStep,
        source: &dyn ManifestSource,
        queue: &mut StepQueue,
    ) -> Result<usize> {
        let path = step.workdir.join(&step.manifest);
        let content = source.fetch(&path).await?;
        if content.is_none() {
            debug!(manifest = %path.display(), "Manifest not found, nothing to build");
        }

        let manifest = Manifest::from_content(content.as_deref())?;
        let steps: Vec<Step> = self
            .expand(&manifest, &step.workdir)
            .into_iter()
            .map(Step::from)
            .collect();

        let injected = queue.insert_after_current(steps)?;
        info!(step = %step.name, packages = injected, "Injected package builds");
        Ok(injected)
    }
}

impl Default for PackageExpander {
    fn default() -> Self {
        Self::new()
    }
}
