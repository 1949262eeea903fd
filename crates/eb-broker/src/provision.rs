use std::sync::Arc;

use eb_infra::CloudGateway;
use eb_infra::types::{LaunchSpec, NativeState, ProviderResource, ResourceId};
use tracing::{error, info, warn};

use crate::correlation::CorrelationTagger;
use crate::locate::ResourceLocator;
use crate::plans::PlanRegistry;
use crate::policy::{self, ProvisionRequest};
use crate::{Error, Result};

/// Result of a successful provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub resource_id: ResourceId,
    pub state: NativeState,
    /// The tagged resource is already running; nothing was created and there
    /// is nothing left to poll. A resource still `pending` reports `false`.
    pub already_existed: bool,
}

/// Validate, create, tag; terminate again if tagging fails.
///
/// Every provider call is attempted once. There is no mutual exclusion:
/// two concurrent calls for the same instance id can both create.
pub struct InstanceProvisioner {
    plans: Arc<PlanRegistry>,
    gateway: Arc<dyn CloudGateway>,
    tagger: CorrelationTagger,
    locator: ResourceLocator,
    key_pair: String,
}

impl InstanceProvisioner {
    pub fn new(
        plans: Arc<PlanRegistry>,
        gateway: Arc<dyn CloudGateway>,
        tagger: CorrelationTagger,
        locator: ResourceLocator,
        key_pair: impl Into<String>,
    ) -> Self {
        Self {
            plans,
            gateway,
            tagger,
            locator,
            key_pair: key_pair.into(),
        }
    }

    pub async fn provision(&self, req: &ProvisionRequest, instance_id: &str) -> Result<Provisioned> {
        let plan = self.plans.lookup(&req.plan_id)?;

        if let Err(violation) = policy::validate(plan, req) {
            warn!(
                plan_id = %plan.id,
                field = %violation.field,
                value = %violation.value,
                "provision request rejected by plan policy"
            );
            return Err(violation.into());
        }

        if let Some(existing) = self.locator.find_live(instance_id).await? {
            return self.resume(instance_id, existing);
        }

        let spec = LaunchSpec {
            image: req.image.clone(),
            network: req.network.clone(),
            security_group: req.security_group.clone(),
            public_address: req.public_address,
            instance_type: plan.instance_type.clone(),
            key_pair: self.key_pair.clone(),
        };

        let resource = match self.gateway.create_resource(&spec).await {
            Ok(resource) => resource,
            Err(e) => {
                error!(
                    error = %e,
                    image = %spec.image,
                    network = %spec.network,
                    security_group = %spec.security_group,
                    "failed to create instance"
                );
                return Err(e.into());
            }
        };
        info!(resource_id = %resource.id, image = %spec.image, "created instance");

        if let Err(tag_error) = self.tagger.tag(&resource.id, instance_id).await {
            error!(
                error = %tag_error,
                resource_id = %resource.id,
                image = %spec.image,
                network = %spec.network,
                security_group = %spec.security_group,
                "failed to tag instance, terminating it"
            );
            return Err(self.compensate(instance_id, resource.id, tag_error).await);
        }

        Ok(Provisioned {
            resource_id: resource.id,
            state: resource.state,
            already_existed: false,
        })
    }

    /// A repeated provision: only a running resource is done, a pending one
    /// is still the same provision in flight. Anything else is on its way
    /// down and cannot be handed out.
    fn resume(&self, instance_id: &str, existing: ProviderResource) -> Result<Provisioned> {
        let already_existed = existing.state.as_str() == NativeState::RUNNING;
        if !already_existed && existing.state.as_str() != NativeState::PENDING {
            warn!(
                resource_id = %existing.id,
                state = %existing.state,
                "instance id is held by a resource that is not running"
            );
            return Err(Error::Unavailable {
                instance_id: instance_id.to_string(),
                resource_id: existing.id,
                state: existing.state,
            });
        }

        info!(resource_id = %existing.id, state = %existing.state, "instance already provisioned");
        Ok(Provisioned {
            resource_id: existing.id,
            state: existing.state,
            already_existed,
        })
    }

    /// Undo a create whose tag never landed. Without the tag nothing can
    /// find the resource again, so a failed cleanup leaves an orphan.
    async fn compensate(
        &self,
        instance_id: &str,
        resource_id: ResourceId,
        tag_error: eb_infra::Error,
    ) -> Error {
        match self.gateway.terminate_resource(&resource_id).await {
            Ok(state) => {
                warn!(resource_id = %resource_id, state = %state, "terminated untagged instance");
                Error::Tagging {
                    resource_id,
                    source: tag_error,
                }
            }
            Err(terminate_error) => {
                error!(
                    resource_id = %resource_id,
                    tag_error = %tag_error,
                    terminate_error = %terminate_error,
                    "failed to terminate untagged instance, manual cleanup required"
                );
                Error::CompensationFailure {
                    instance_id: instance_id.to_string(),
                    resource_id,
                    tag_error,
                    terminate_error,
                }
            }
        }
    }
}
