//! In-memory `CloudGateway` that records every call.
//!
//! Failures are injected one call at a time with the `fail_next_*` methods.
//! Failed calls are recorded too, so tests can assert on the exact sequence
//! the core issued.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::types::{LaunchSpec, NativeState, ProviderResource, ResourceId};
use crate::{CloudGateway, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create(LaunchSpec),
    Tag {
        id: ResourceId,
        key: String,
        value: String,
    },
    Terminate(ResourceId),
    Describe {
        key: String,
        value: String,
    },
}

#[derive(Default)]
struct Failures {
    create: Option<String>,
    tag: Option<String>,
    terminate: Option<String>,
    describe: Option<String>,
}

#[derive(Default)]
struct Inner {
    resources: Vec<ProviderResource>,
    calls: Vec<GatewayCall>,
    created: u32,
    failures: Failures,
}

#[derive(Default)]
pub struct InMemoryGateway {
    inner: Mutex<Inner>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a resource carrying a single tag.
    pub fn with_tagged(self, id: &str, state: &str, key: &str, value: &str) -> Self {
        self.insert(ProviderResource {
            id: ResourceId(id.into()),
            state: NativeState::new(state),
            tags: HashMap::from([(key.to_string(), value.to_string())]),
        });
        self
    }

    pub fn insert(&self, resource: ProviderResource) {
        self.lock().resources.push(resource);
    }

    pub fn set_state(&self, id: &str, state: &str) {
        let mut inner = self.lock();
        if let Some(r) = inner.resources.iter_mut().find(|r| r.id.0 == id) {
            r.state = NativeState::new(state);
        }
    }

    pub fn resource(&self, id: &str) -> Option<ProviderResource> {
        self.lock().resources.iter().find(|r| r.id.0 == id).cloned()
    }

    pub fn fail_next_create(&self, message: &str) {
        self.lock().failures.create = Some(message.into());
    }

    pub fn fail_next_tag(&self, message: &str) {
        self.lock().failures.tag = Some(message.into());
    }

    pub fn fail_next_terminate(&self, message: &str) {
        self.lock().failures.terminate = Some(message.into());
    }

    pub fn fail_next_describe(&self, message: &str) {
        self.lock().failures.describe = Some(message.into());
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn creates(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::Create(_)))
    }

    pub fn tags(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::Tag { .. }))
    }

    pub fn terminates(&self) -> Vec<ResourceId> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                GatewayCall::Terminate(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Calls that mutate the provider (everything except describe).
    pub fn mutations(&self) -> usize {
        self.count(|c| !matches!(c, GatewayCall::Describe { .. }))
    }

    fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl CloudGateway for InMemoryGateway {
    async fn create_resource(&self, spec: &LaunchSpec) -> Result<ProviderResource> {
        let mut inner = self.lock();
        inner.calls.push(GatewayCall::Create(spec.clone()));
        if let Some(msg) = inner.failures.create.take() {
            return Err(Error::Injected(msg));
        }

        inner.created += 1;
        let resource = ProviderResource {
            id: ResourceId(format!("r-{}", inner.created)),
            state: NativeState::new(NativeState::PENDING),
            tags: HashMap::new(),
        };
        inner.resources.push(resource.clone());
        Ok(resource)
    }

    async fn apply_tag(&self, id: &ResourceId, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(GatewayCall::Tag {
            id: id.clone(),
            key: key.into(),
            value: value.into(),
        });
        if let Some(msg) = inner.failures.tag.take() {
            return Err(Error::Injected(msg));
        }

        let resource = inner
            .resources
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Error::Ec2(format!("unknown resource {id}")))?;
        resource.tags.insert(key.into(), value.into());
        Ok(())
    }

    async fn terminate_resource(&self, id: &ResourceId) -> Result<NativeState> {
        let mut inner = self.lock();
        inner.calls.push(GatewayCall::Terminate(id.clone()));
        if let Some(msg) = inner.failures.terminate.take() {
            return Err(Error::Injected(msg));
        }

        let resource = inner
            .resources
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Error::Ec2(format!("unknown resource {id}")))?;
        if !resource.state.is_terminated() {
            resource.state = NativeState::new(NativeState::SHUTTING_DOWN);
        }
        Ok(resource.state.clone())
    }

    async fn describe_by_tag(&self, key: &str, value: &str) -> Result<Vec<ProviderResource>> {
        let mut inner = self.lock();
        inner.calls.push(GatewayCall::Describe {
            key: key.into(),
            value: value.into(),
        });
        if let Some(msg) = inner.failures.describe.take() {
            return Err(Error::Injected(msg));
        }

        Ok(inner
            .resources
            .iter()
            .filter(|r| r.tags.get(key).is_some_and(|v| v == value))
            .cloned()
            .collect())
    }
}
