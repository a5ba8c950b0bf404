//! Downstream rebuild triggers.
//!
//! A trigger target is a remote image build that should be rebuilt when
//! this CI produces something it depends on. Targets declare tags; builders
//! notify the targets whose tags are relevant to what they just built.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Registry that receives rebuild triggers unless configured otherwise.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.hub.docker.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TriggerTarget {
    /// Repository name on the registry, e.g. `liridev/ci-archlinux`.
    pub name: String,
    /// Trigger token issued by the registry.
    pub token: String,
    /// What this target cares about. An empty set never matches.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl TriggerTarget {
    pub fn new<I, S>(name: impl Into<String>, token: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            token: token.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(tags)
    }
}

/// Trigger endpoint: `<base>/u/{name}/trigger/{token}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EndpointTemplate {
    base_url: String,
}

impl EndpointTemplate {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn render(&self, name: &str, token: &str) -> String {
        format!(
            "{}/u/{}/trigger/{}/",
            self.base_url.trim_end_matches('/'),
            name,
            token
        )
    }
}

impl Default for EndpointTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

/// Outbound rebuild notification for one matched target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationRequest {
    /// Step label, `trigger rebuild <target>`.
    pub name: String,
    pub target: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

impl NotificationRequest {
    pub fn for_target(target: &TriggerTarget, template: &EndpointTemplate) -> Self {
        Self {
            name: format!("trigger rebuild {}", target.name),
            target: target.name.clone(),
            url: template.render(&target.name, &target.token),
            headers: BTreeMap::from([(
                "Content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: serde_json::json!({ "build": true }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_endpoint() {
        let template = EndpointTemplate::default();
        assert_eq!(
            template.render("liridev/ci-archlinux", "abc-123"),
            "https://registry.hub.docker.com/u/liridev/ci-archlinux/trigger/abc-123/"
        );
    }

    #[test]
    fn test_render_trims_trailing_slash() {
        let template = EndpointTemplate::new("http://127.0.0.1:8080/");
        assert_eq!(template.render("x", "t"), "http://127.0.0.1:8080/u/x/trigger/t/");
    }

    #[test]
    fn test_request_shape() {
        let target = TriggerTarget::new("x", "tok", ["packages"]);
        let req = NotificationRequest::for_target(&target, &EndpointTemplate::default());
        assert_eq!(req.name, "trigger rebuild x");
        assert_eq!(req.headers.get("Content-type").unwrap(), "application/json");
        assert_eq!(req.body, serde_json::json!({"build": true}));
    }

    #[test]
    fn test_empty_tags_never_match() {
        let target = TriggerTarget::new("x", "tok", Vec::<String>::new());
        let wanted: BTreeSet<String> = ["packages".to_string()].into();
        assert!(!target.has_any_tag(&wanted));
        assert!(!target.has_tag("packages"));
    }

    #[test]
    fn test_tags_default_when_missing() {
        let target: TriggerTarget = serde_json::from_str(r#"{"name":"x","token":"t"}"#).unwrap();
        assert!(target.tags.is_empty());
    }
}
