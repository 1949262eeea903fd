use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{
    Filter, Instance, InstanceNetworkInterfaceSpecification, InstanceState, InstanceType, Tag,
};
use tracing::{debug, info};

use crate::types::{LaunchSpec, NativeState, ProviderResource, ResourceId};
use crate::{CloudGateway, Error, Result};

/// EC2 gateway using the `aws-sdk-ec2` crate.
///
/// Credentials come from the default AWS provider chain (env vars, profile,
/// instance role). Only the region is configured explicitly.
pub struct Ec2Gateway {
    client: Client,
}

impl Ec2Gateway {
    /// Build a client for `region`, falling back to the SDK's own region
    /// resolution (`AWS_REGION`, profile) when `None`.
    pub async fn connect(region: Option<String>) -> Self {
        dotenvy::dotenv().ok();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        debug!(region = ?sdk_config.region(), "ec2: client configured");

        Self {
            client: Client::new(&sdk_config),
        }
    }

    fn state_name(state: Option<&InstanceState>) -> Result<NativeState> {
        state
            .and_then(|s| s.name())
            .map(|name| NativeState::new(name.as_str()))
            .ok_or_else(|| Error::InvalidResponse("instance has no state".into()))
    }

    fn tags(tags: &[Tag]) -> HashMap<String, String> {
        tags.iter()
            .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
            .collect()
    }

    fn resource_from(instance: &Instance) -> Result<ProviderResource> {
        let id = instance
            .instance_id()
            .ok_or_else(|| Error::InvalidResponse("instance has no id".into()))?;

        Ok(ProviderResource {
            id: ResourceId(id.to_string()),
            state: Self::state_name(instance.state())?,
            tags: Self::tags(instance.tags()),
        })
    }
}

#[async_trait]
impl CloudGateway for Ec2Gateway {
    async fn create_resource(&self, spec: &LaunchSpec) -> Result<ProviderResource> {
        // The public IP flag is only expressible on an explicit network interface.
        let interface = InstanceNetworkInterfaceSpecification::builder()
            .associate_public_ip_address(spec.public_address)
            .device_index(0)
            .subnet_id(&spec.network)
            .groups(&spec.security_group)
            .build();

        let resp = self
            .client
            .run_instances()
            .image_id(&spec.image)
            .min_count(1)
            .max_count(1)
            .instance_type(InstanceType::from(spec.instance_type.as_str()))
            .key_name(&spec.key_pair)
            .network_interfaces(interface)
            .send()
            .await
            .map_err(|e| Error::Ec2(format!("run instances: {}", DisplayErrorContext(&e))))?;

        let instance = resp
            .instances()
            .first()
            .ok_or_else(|| Error::InvalidResponse("run instances returned no instance".into()))?;
        let resource = Self::resource_from(instance)?;

        info!(resource_id = %resource.id, image = %spec.image, "ec2: instance launched");
        Ok(resource)
    }

    async fn apply_tag(&self, id: &ResourceId, key: &str, value: &str) -> Result<()> {
        self.client
            .create_tags()
            .resources(&id.0)
            .tags(Tag::builder().key(key).value(value).build())
            .send()
            .await
            .map_err(|e| Error::Ec2(format!("create tags: {}", DisplayErrorContext(&e))))?;

        info!(resource_id = %id, key, value, "ec2: instance tagged");
        Ok(())
    }

    async fn terminate_resource(&self, id: &ResourceId) -> Result<NativeState> {
        let resp = self
            .client
            .terminate_instances()
            .instance_ids(&id.0)
            .send()
            .await
            .map_err(|e| {
                Error::Ec2(format!("terminate instances: {}", DisplayErrorContext(&e)))
            })?;

        let change = resp.terminating_instances().first().ok_or_else(|| {
            Error::InvalidResponse("terminate instances returned no state change".into())
        })?;
        let state = Self::state_name(change.current_state())?;

        info!(resource_id = %id, state = %state, "ec2: instance terminating");
        Ok(state)
    }

    async fn describe_by_tag(&self, key: &str, value: &str) -> Result<Vec<ProviderResource>> {
        let filter = Filter::builder()
            .name(format!("tag:{key}"))
            .values(value)
            .build();

        let mut resources = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let resp = self
                .client
                .describe_instances()
                .filters(filter.clone())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    Error::Ec2(format!("describe instances: {}", DisplayErrorContext(&e)))
                })?;

            for reservation in resp.reservations() {
                for instance in reservation.instances() {
                    resources.push(Self::resource_from(instance)?);
                }
            }

            match resp.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(key, value, matches = resources.len(), "ec2: described by tag");
        Ok(resources)
    }
}
