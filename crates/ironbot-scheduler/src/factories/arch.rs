//! Arch Linux package and ISO builders.

use super::{BuildFactory, checkout_sources};
use crate::triggers::{TagFilter, TriggerDispatcher};
use ironbot_core::pipeline::{ExecutionStep, ExpandStep, Step};
use ironbot_core::run::BuildProperties;
use ironbot_core::trigger::TriggerTarget;
use std::path::PathBuf;
use std::sync::Arc;

/// Tag a trigger target declares to be rebuilt after package builds.
pub const PACKAGES_TAG: &str = "packages";

const UNSTABLE_DATABASE: &str = "/repo//liri-unstable.db.tar.gz";
const NIGHTLY_IMAGES: &str = "/repo/images/nightly";

/// Builds the changed Arch packages, then triggers dependent image rebuilds.
pub struct ArchPackagesFactory {
    triggers: Arc<[TriggerTarget]>,
    dispatcher: TriggerDispatcher,
    workdir: PathBuf,
}

impl ArchPackagesFactory {
    pub fn new(triggers: Arc<[TriggerTarget]>, dispatcher: TriggerDispatcher) -> Self {
        Self {
            triggers,
            dispatcher,
            workdir: PathBuf::from("build"),
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }
}

impl BuildFactory for ArchPackagesFactory {
    fn kind(&self) -> &'static str {
        "arch_packages"
    }

    fn steps(&self, props: &BuildProperties) -> Vec<Step> {
        let mut steps = vec![
            checkout_sources(props),
            ExecutionStep::new("create database", ["repo-add", UNSTABLE_DATABASE]).into(),
            Step::ExpandPackages(ExpandStep::new("select packages", &self.workdir)),
        ];
        steps.extend(
            self.dispatcher
                .dispatch(&self.triggers, &TagFilter::contains(PACKAGES_TAG))
                .into_iter()
                .map(Step::from),
        );
        steps
    }
}

/// Builds the nightly live image and prunes old ones.
pub struct ArchIsoFactory {
    workdir: PathBuf,
    retention_days: u32,
}

impl ArchIsoFactory {
    pub fn new(retention_days: u32) -> Self {
        Self {
            workdir: PathBuf::from("build"),
            retention_days,
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }
}

impl Default for ArchIsoFactory {
    fn default() -> Self {
        Self::new(7)
    }
}

impl BuildFactory for ArchIsoFactory {
    fn kind(&self) -> &'static str {
        "arch_iso"
    }

    fn steps(&self, props: &BuildProperties) -> Vec<Step> {
        let livecd = self.workdir.join("livecd");
        let output = format!("{}/", NIGHTLY_IMAGES);
        let prune = format!(
            "find {} -type f -mtime +{} -exec rm {{}} \\;",
            NIGHTLY_IMAGES, self.retention_days
        );

        vec![
            checkout_sources(props),
            ExecutionStep::new("build image", ["sudo", "./build.sh", "-v", "-o", output.as_str()])
                .workdir(&livecd)
                .halt_on_failure()
                .into(),
            ExecutionStep::new("clean up", ["sudo", "rm", "-rf", "work"])
                .workdir(&livecd)
                .into(),
            ExecutionStep::new("remove old images", ["bash", "-c", prune.as_str()]).into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::test_support::{names, props};

    fn catalog() -> Arc<[TriggerTarget]> {
        vec![
            TriggerTarget::new("liridev/ci-archlinux", "t1", ["packages"]),
            TriggerTarget::new("liridev/iso", "t2", ["iso"]),
            TriggerTarget::new("liridev/flatpak", "t3", ["packages", "flatpak"]),
        ]
        .into()
    }

    #[test]
    fn test_packages_steps() {
        let factory = ArchPackagesFactory::new(catalog(), TriggerDispatcher::default());
        let steps = factory.steps(&props());

        assert_eq!(
            names(&steps),
            vec![
                "checkout sources",
                "create database",
                "select packages",
                "trigger rebuild liridev/ci-archlinux",
                "trigger rebuild liridev/flatpak",
            ]
        );
        assert!(steps[2].halt_on_failure());
        assert!(!steps[1].halt_on_failure());
        assert!(!steps[3].halt_on_failure());
    }

    #[test]
    fn test_packages_without_matching_triggers() {
        let catalog: Arc<[TriggerTarget]> =
            vec![TriggerTarget::new("liridev/iso", "t", ["iso"])].into();
        let factory = ArchPackagesFactory::new(catalog, TriggerDispatcher::default());
        assert_eq!(factory.steps(&props()).len(), 3);
    }

    #[test]
    fn test_iso_steps() {
        let steps = ArchIsoFactory::default().steps(&props());
        assert_eq!(
            names(&steps),
            vec!["checkout sources", "build image", "clean up", "remove old images"]
        );

        let Step::Shell(build) = &steps[1] else {
            panic!("expected shell step");
        };
        assert_eq!(build.workdir, Some(PathBuf::from("build/livecd")));
        assert_eq!(
            build.display_command(),
            "sudo ./build.sh -v -o /repo/images/nightly/"
        );
        assert!(build.halt_on_failure);

        let Step::Shell(prune) = &steps[3] else {
            panic!("expected shell step");
        };
        assert_eq!(
            prune.command[2],
            "find /repo/images/nightly -type f -mtime +7 -exec rm {} \\;"
        );
    }
}
