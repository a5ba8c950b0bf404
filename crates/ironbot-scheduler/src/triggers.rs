//! Tag-based trigger matching and dispatch.

use ironbot_core::trigger::{EndpointTemplate, NotificationRequest, TriggerTarget};
use std::collections::BTreeSet;
use tracing::debug;

/// Which targets a builder cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// Match targets declaring at least one of these tags.
    AnyOf(BTreeSet<String>),
    /// Match targets declaring this exact tag.
    Contains(String),
}

impl TagFilter {
    pub fn any_of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagFilter::AnyOf(tags.into_iter().map(Into::into).collect())
    }

    pub fn contains(tag: impl Into<String>) -> Self {
        TagFilter::Contains(tag.into())
    }

    pub fn matches(&self, target: &TriggerTarget) -> bool {
        match self {
            TagFilter::AnyOf(tags) => target.has_any_tag(tags),
            TagFilter::Contains(tag) => target.has_tag(tag),
        }
    }
}

/// Turns a trigger catalog into rebuild notifications.
#[derive(Debug, Clone, Default)]
pub struct TriggerDispatcher {
    template: EndpointTemplate,
}

impl TriggerDispatcher {
    pub fn new(template: EndpointTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &EndpointTemplate {
        &self.template
    }

    /// Targets matching `filter`, in catalog order.
    pub fn select<'a>(
        &self,
        targets: &'a [TriggerTarget],
        filter: &'a TagFilter,
    ) -> impl Iterator<Item = &'a TriggerTarget> + 'a {
        targets.iter().filter(move |t| filter.matches(t))
    }

    /// One request per matching target, in catalog order.
    ///
    /// Targets sharing a name are not merged: each yields its own request.
    pub fn dispatch(
        &self,
        targets: &[TriggerTarget],
        filter: &TagFilter,
    ) -> Vec<NotificationRequest> {
        let requests: Vec<_> = self
            .select(targets, filter)
            .map(|t| NotificationRequest::for_target(t, &self.template))
            .collect();
        debug!(
            candidates = targets.len(),
            matched = requests.len(),
            "Selected rebuild triggers"
        );
        requests
    }
}
