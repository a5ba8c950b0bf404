//! Rebuild triggers for the container images the CI itself runs on.

use super::BuildFactory;
use crate::triggers::{TagFilter, TriggerDispatcher};
use ironbot_core::pipeline::Step;
use ironbot_core::run::BuildProperties;
use ironbot_core::trigger::TriggerTarget;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Notifies every target sharing a tag with `tags`. Nothing else.
pub struct DockerHubFactory {
    triggers: Arc<[TriggerTarget]>,
    filter: TagFilter,
    dispatcher: TriggerDispatcher,
}

impl DockerHubFactory {
    pub fn new(
        triggers: Arc<[TriggerTarget]>,
        tags: BTreeSet<String>,
        dispatcher: TriggerDispatcher,
    ) -> Self {
        Self {
            triggers,
            filter: TagFilter::AnyOf(tags),
            dispatcher,
        }
    }
}

impl BuildFactory for DockerHubFactory {
    fn kind(&self) -> &'static str {
        "docker_hub"
    }

    fn steps(&self, _props: &BuildProperties) -> Vec<Step> {
        self.dispatcher
            .dispatch(&self.triggers, &self.filter)
            .into_iter()
            .map(Step::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::test_support::{names, props};

    fn catalog() -> Arc<[TriggerTarget]> {
        vec![
            TriggerTarget::new("liridev/ci-archlinux", "t1", ["archlinux"]),
            TriggerTarget::new("liridev/ci-fedora", "t2", ["fedora"]),
            TriggerTarget::new("liridev/ci-flatpak", "t3", ["flatpak", "archlinux"]),
        ]
        .into()
    }

    fn tags(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_only_notify_steps() {
        let factory =
            DockerHubFactory::new(catalog(), tags(&["archlinux"]), TriggerDispatcher::default());
        let steps = factory.steps(&props());

        assert_eq!(
            names(&steps),
            vec!["trigger rebuild liridev/ci-archlinux", "trigger rebuild liridev/ci-flatpak"]
        );
        assert!(steps.iter().all(|s| matches!(s, Step::Notify(_))));
    }

    #[test]
    fn test_no_match_adds_no_steps() {
        let factory =
            DockerHubFactory::new(catalog(), tags(&["debian"]), TriggerDispatcher::default());
        assert!(factory.steps(&props()).is_empty());
    }
}
