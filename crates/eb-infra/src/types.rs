use std::collections::HashMap;
use std::fmt;

/// Opaque provider-side resource identifier (e.g. an EC2 instance ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(pub String);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-native lifecycle state, kept verbatim.
///
/// The broker never interprets this beyond a handful of well-known EC2
/// names; translation into progress states happens in the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativeState(pub String);

impl NativeState {
    pub const PENDING: &'static str = "pending";
    pub const RUNNING: &'static str = "running";
    pub const SHUTTING_DOWN: &'static str = "shutting-down";
    pub const STOPPING: &'static str = "stopping";
    pub const STOPPED: &'static str = "stopped";
    pub const TERMINATED: &'static str = "terminated";

    pub fn new(state: impl Into<String>) -> Self {
        Self(state.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Gone for good; the provider only keeps it visible for a while.
    pub fn is_terminated(&self) -> bool {
        self.0 == Self::TERMINATED
    }

    /// Destruction already accepted by the provider.
    pub fn is_terminating(&self) -> bool {
        self.0 == Self::SHUTTING_DOWN || self.is_terminated()
    }
}

impl fmt::Display for NativeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Specification for launching exactly one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub image: String,
    pub network: String,
    pub security_group: String,
    pub public_address: bool,
    pub instance_type: String,
    pub key_pair: String,
}

/// Resource status and metadata returned from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResource {
    pub id: ResourceId,
    pub state: NativeState,
    pub tags: HashMap<String, String>,
}
