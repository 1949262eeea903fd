pub mod ec2;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod types;

use async_trait::async_trait;
use types::{LaunchSpec, NativeState, ProviderResource, ResourceId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ec2 api error: {0}")]
    Ec2(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("injected failure: {0}")]
    Injected(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Backend-agnostic primitives against the cloud API.
///
/// Every call is attempted once; implementations must not retry. The
/// provider is the single source of truth, so nothing here caches state.
#[async_trait]
pub trait CloudGateway: Send + Sync + 'static {
    /// Launch exactly one resource. Fails atomically.
    async fn create_resource(&self, spec: &LaunchSpec) -> Result<ProviderResource>;

    /// Attach (or overwrite) a single tag on a resource.
    async fn apply_tag(&self, id: &ResourceId, key: &str, value: &str) -> Result<()>;

    /// Request termination; returns the state right after the request is accepted.
    async fn terminate_resource(&self, id: &ResourceId) -> Result<NativeState>;

    /// All resources whose tag `key` equals `value`, terminated ones included.
    async fn describe_by_tag(&self, key: &str, value: &str) -> Result<Vec<ProviderResource>>;
}
