use std::sync::Arc;

use eb_infra::CloudGateway;
use eb_infra::types::NativeState;
use tracing::{error, info};

use crate::Result;
use crate::locate::ResourceLocator;

pub struct InstanceTerminator {
    gateway: Arc<dyn CloudGateway>,
    locator: ResourceLocator,
}

impl InstanceTerminator {
    pub fn new(gateway: Arc<dyn CloudGateway>, locator: ResourceLocator) -> Self {
        Self { gateway, locator }
    }

    /// Terminate the resource behind `instance_id` and return the state the
    /// provider reports right after accepting the request.
    ///
    /// A resource that is already going away is left alone.
    pub async fn terminate(&self, instance_id: &str) -> Result<NativeState> {
        let resource = self.locator.locate(instance_id).await?;

        if resource.state.is_terminating() {
            info!(resource_id = %resource.id, state = %resource.state, "instance already terminating");
            return Ok(resource.state);
        }

        match self.gateway.terminate_resource(&resource.id).await {
            Ok(state) => {
                info!(resource_id = %resource.id, state = %state, "terminated instance");
                Ok(state)
            }
            Err(e) => {
                error!(error = %e, resource_id = %resource.id, "failed to terminate instance");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eb_infra::memory::InMemoryGateway;
    use eb_infra::types::ResourceId;

    use super::*;
    use crate::Error;
    use crate::correlation::CorrelationTag;

    const KEY: &str = "cf-brokerInstance";

    fn terminator(gw: &Arc<InMemoryGateway>) -> InstanceTerminator {
        let gateway: Arc<dyn CloudGateway> = gw.clone();
        let locator = ResourceLocator::new(gateway.clone(), CorrelationTag::with_prefix("cf-"));
        InstanceTerminator::new(gateway, locator)
    }

    #[tokio::test]
    async fn terminates_located_resource() {
        let gw = Arc::new(InMemoryGateway::new().with_tagged("r-1", "running", KEY, "inst-1"));

        let state = terminator(&gw).terminate("inst-1").await.unwrap();
        assert_eq!(state.as_str(), "shutting-down");
        assert_eq!(gw.terminates(), vec![ResourceId("r-1".into())]);
    }

    #[tokio::test]
    async fn unknown_instance_is_not_found() {
        let gw = Arc::new(InMemoryGateway::new());

        let err = terminator(&gw).terminate("inst-9").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(id) if id == "inst-9"));
        assert!(gw.terminates().is_empty());
    }

    #[tokio::test]
    async fn already_terminating_instance_is_not_terminated_again() {
        let gw = Arc::new(InMemoryGateway::new().with_tagged("r-1", "terminated", KEY, "inst-1"));

        let state = terminator(&gw).terminate("inst-1").await.unwrap();
        assert_eq!(state.as_str(), "terminated");
        assert!(gw.terminates().is_empty());
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let gw = Arc::new(InMemoryGateway::new().with_tagged("r-1", "running", KEY, "inst-1"));
        gw.fail_next_terminate("UnauthorizedOperation");

        let err = terminator(&gw).terminate("inst-1").await.unwrap_err();
        assert!(matches!(err, Error::Gateway(_)));
    }
}
