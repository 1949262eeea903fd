use std::sync::Arc;

use eb_infra::CloudGateway;
use eb_infra::types::NativeState;
use tracing::{Instrument, Span, info, info_span};

use crate::Result;
use crate::correlation::{CorrelationTag, CorrelationTagger};
use crate::locate::ResourceLocator;
use crate::operation::OperationToken;
use crate::plans::PlanRegistry;
use crate::policy::ProvisionRequest;
use crate::provision::InstanceProvisioner;
use crate::status::{self, ProgressState};
use crate::terminate::InstanceTerminator;

/// Process-wide settings the core needs from configuration.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub tag_prefix: String,
    pub key_pair: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionAck {
    pub operation: OperationToken,
    /// Already running; there is no operation to poll.
    pub already_existed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprovisionAck {
    pub operation: OperationToken,
    pub state: NativeState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub state: ProgressState,
    /// Provider-native state, for humans.
    pub description: String,
}

/// Provision, deprovision and inspect broker-managed instances.
///
/// Each call does its own provider round-trips and returns; asynchrony is
/// the caller polling `inspect`. The only shared state is the read-only
/// plan registry.
pub struct Broker {
    plans: Arc<PlanRegistry>,
    provisioner: InstanceProvisioner,
    terminator: InstanceTerminator,
    locator: ResourceLocator,
    span: Span,
}

impl Broker {
    /// `span` is the parent for every operation's span.
    pub fn new(
        plans: Arc<PlanRegistry>,
        gateway: Arc<dyn CloudGateway>,
        settings: BrokerSettings,
        span: Span,
    ) -> Self {
        let tag = CorrelationTag::with_prefix(&settings.tag_prefix);
        let locator = ResourceLocator::new(gateway.clone(), tag.clone());
        let tagger = CorrelationTagger::new(gateway.clone(), tag);

        Self {
            provisioner: InstanceProvisioner::new(
                plans.clone(),
                gateway.clone(),
                tagger,
                locator.clone(),
                settings.key_pair,
            ),
            terminator: InstanceTerminator::new(gateway, locator.clone()),
            plans,
            locator,
            span,
        }
    }

    pub fn plans(&self) -> &PlanRegistry {
        &self.plans
    }

    pub async fn provision(&self, instance_id: &str, req: &ProvisionRequest) -> Result<ProvisionAck> {
        let span = info_span!(
            parent: &self.span,
            "provision",
            instance_id,
            plan_id = %req.plan_id,
            image = %req.image,
            network = %req.network,
            security_group = %req.security_group,
            public_address = req.public_address,
        );

        async {
            let provisioned = self.provisioner.provision(req, instance_id).await?;
            info!(resource_id = %provisioned.resource_id, "provision accepted");
            Ok(ProvisionAck {
                operation: OperationToken::Provision,
                already_existed: provisioned.already_existed,
            })
        }
        .instrument(span)
        .await
    }

    pub async fn deprovision(&self, instance_id: &str) -> Result<DeprovisionAck> {
        let span = info_span!(parent: &self.span, "deprovision", instance_id);

        async {
            let state = self.terminator.terminate(instance_id).await?;
            Ok(DeprovisionAck {
                operation: OperationToken::Deprovision,
                state,
            })
        }
        .instrument(span)
        .await
    }

    /// The token is checked before any provider call.
    pub async fn inspect(&self, instance_id: &str, token: Option<&str>) -> Result<Inspection> {
        let span = info_span!(parent: &self.span, "inspect", instance_id, operation = token);

        async {
            let operation = OperationToken::parse_echoed(token)?;
            let resource = self.locator.locate(instance_id).await?;
            Ok(Inspection {
                state: status::translate(operation, &resource.state),
                description: resource.state.0,
            })
        }
        .instrument(span)
        .await
    }
}
