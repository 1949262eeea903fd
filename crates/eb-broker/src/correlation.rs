use std::sync::Arc;

use eb_infra::CloudGateway;
use eb_infra::types::ResourceId;

/// Fixed suffix appended to the configured prefix to form the tag key.
pub const TAG_SUFFIX: &str = "brokerInstance";

/// Tag key linking a provider resource to a logical instance id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationTag {
    key: String,
}

impl CorrelationTag {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            key: format!("{prefix}{TAG_SUFFIX}"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Writes the correlation tag onto a freshly created resource.
#[derive(Clone)]
pub struct CorrelationTagger {
    gateway: Arc<dyn CloudGateway>,
    tag: CorrelationTag,
}

impl CorrelationTagger {
    pub fn new(gateway: Arc<dyn CloudGateway>, tag: CorrelationTag) -> Self {
        Self { gateway, tag }
    }

    /// Re-tagging with the same value is a no-op at the provider.
    pub async fn tag(&self, resource_id: &ResourceId, instance_id: &str) -> eb_infra::Result<()> {
        self.gateway
            .apply_tag(resource_id, self.tag.key(), instance_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use eb_infra::memory::{GatewayCall, InMemoryGateway};

    use super::*;

    #[test]
    fn key_is_prefix_plus_suffix() {
        assert_eq!(CorrelationTag::with_prefix("cf-").key(), "cf-brokerInstance");
        assert_eq!(CorrelationTag::with_prefix("").key(), "brokerInstance");
    }

    #[tokio::test]
    async fn writes_exactly_one_tag() {
        let gw = Arc::new(InMemoryGateway::new().with_tagged("r-1", "pending", "Name", "web"));
        let tagger = CorrelationTagger::new(gw.clone(), CorrelationTag::with_prefix("cf-"));

        tagger.tag(&ResourceId("r-1".into()), "inst-1").await.unwrap();

        assert_eq!(
            gw.calls(),
            vec![GatewayCall::Tag {
                id: ResourceId("r-1".into()),
                key: "cf-brokerInstance".into(),
                value: "inst-1".into(),
            }]
        );
        let tags = gw.resource("r-1").unwrap().tags;
        assert_eq!(tags.get("cf-brokerInstance").map(String::as_str), Some("inst-1"));
    }

    #[tokio::test]
    async fn retagging_with_same_value_changes_nothing() {
        let gw = Arc::new(InMemoryGateway::new().with_tagged("r-1", "pending", "Name", "web"));
        let tagger = CorrelationTagger::new(gw.clone(), CorrelationTag::with_prefix("cf-"));
        let id = ResourceId("r-1".into());

        tagger.tag(&id, "inst-1").await.unwrap();
        let first = gw.resource("r-1").unwrap().tags;
        tagger.tag(&id, "inst-1").await.unwrap();
        let second = gw.resource("r-1").unwrap().tags;

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
        assert_eq!(gw.tags(), 2);
    }
}
