use std::sync::Arc;

use eb_infra::CloudGateway;
use eb_infra::types::ProviderResource;
use tracing::error;

use crate::correlation::CorrelationTag;
use crate::{Error, Result};

/// Finds the provider resource behind a logical instance id.
///
/// Terminated resources stay visible at the provider for a while after
/// destruction. They are only returned when nothing live carries the tag,
/// and never count towards ambiguity.
#[derive(Clone)]
pub struct ResourceLocator {
    gateway: Arc<dyn CloudGateway>,
    tag: CorrelationTag,
}

impl ResourceLocator {
    pub fn new(gateway: Arc<dyn CloudGateway>, tag: CorrelationTag) -> Self {
        Self { gateway, tag }
    }

    /// Falls back to a terminated resource so a finished deprovision can be observed.
    pub async fn locate(&self, instance_id: &str) -> Result<ProviderResource> {
        let (live, tombstone) = self.matches(instance_id).await?;
        match live {
            Some(resource) => Ok(resource),
            None => tombstone.ok_or_else(|| Error::NotFound(instance_id.to_string())),
        }
    }

    /// Like `locate`, but terminated resources count as absent.
    pub async fn find_live(&self, instance_id: &str) -> Result<Option<ProviderResource>> {
        Ok(self.matches(instance_id).await?.0)
    }

    async fn matches(
        &self,
        instance_id: &str,
    ) -> Result<(Option<ProviderResource>, Option<ProviderResource>)> {
        let found = self
            .gateway
            .describe_by_tag(self.tag.key(), instance_id)
            .await?;

        let (mut live, mut terminated): (Vec<_>, Vec<_>) =
            found.into_iter().partition(|r| !r.state.is_terminated());

        if live.len() > 1 {
            let ids: Vec<_> = live.iter().map(|r| r.id.0.as_str()).collect();
            error!(
                instance_id,
                count = live.len(),
                resource_ids = ?ids,
                "multiple resources carry the same correlation tag"
            );
            return Err(Error::AmbiguousMatch {
                instance_id: instance_id.to_string(),
                count: live.len(),
            });
        }

        let tombstone = if terminated.is_empty() {
            None
        } else {
            Some(terminated.swap_remove(0))
        };
        Ok((live.pop(), tombstone))
    }
}

#[cfg(test)]
mod tests {
    use eb_infra::memory::InMemoryGateway;

    use super::*;

    const KEY: &str = "cf-brokerInstance";

    fn locator(gw: InMemoryGateway) -> ResourceLocator {
        ResourceLocator::new(Arc::new(gw), CorrelationTag::with_prefix("cf-"))
    }

    #[tokio::test]
    async fn no_match_is_not_found() {
        let loc = locator(InMemoryGateway::new().with_tagged("r-1", "running", KEY, "other"));
        assert!(matches!(loc.locate("inst-1").await, Err(Error::NotFound(id)) if id == "inst-1"));
    }

    #[tokio::test]
    async fn single_match_is_returned() {
        let loc = locator(InMemoryGateway::new().with_tagged("r-1", "running", KEY, "inst-1"));
        let found = loc.locate("inst-1").await.unwrap();
        assert_eq!(found.id.0, "r-1");
        assert_eq!(found.state.as_str(), "running");
    }

    #[tokio::test]
    async fn two_live_matches_are_ambiguous() {
        let loc = locator(
            InMemoryGateway::new()
                .with_tagged("r-1", "running", KEY, "inst-1")
                .with_tagged("r-2", "pending", KEY, "inst-1"),
        );
        let err = loc.locate("inst-1").await.unwrap_err();
        assert!(matches!(err, Error::AmbiguousMatch { count: 2, .. }));

        let err = loc.find_live("inst-1").await.unwrap_err();
        assert!(matches!(err, Error::AmbiguousMatch { count: 2, .. }));
    }

    #[tokio::test]
    async fn terminated_resources_yield_to_live_ones() {
        let loc = locator(
            InMemoryGateway::new()
                .with_tagged("r-old", "terminated", KEY, "inst-1")
                .with_tagged("r-new", "running", KEY, "inst-1"),
        );
        assert_eq!(loc.locate("inst-1").await.unwrap().id.0, "r-new");
    }

    #[tokio::test]
    async fn terminated_resource_is_still_locatable() {
        let loc = locator(InMemoryGateway::new().with_tagged("r-1", "terminated", KEY, "inst-1"));

        assert_eq!(loc.locate("inst-1").await.unwrap().state.as_str(), "terminated");
        assert!(loc.find_live("inst-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn gateway_failure_propagates() {
        let gw = InMemoryGateway::new();
        gw.fail_next_describe("throttled");
        let err = locator(gw).locate("inst-1").await.unwrap_err();
        assert!(matches!(err, Error::Gateway(_)));
    }
}
