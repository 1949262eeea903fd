//! Lifecycle orchestration for broker-managed cloud instances.
//!
//! A logical instance id chosen by the marketplace is mapped onto exactly one
//! provider resource through a correlation tag. Nothing is stored locally:
//! every lookup goes back to the provider.

pub mod broker;
pub mod correlation;
pub mod locate;
pub mod operation;
pub mod plans;
pub mod policy;
pub mod provision;
pub mod status;
pub mod terminate;

pub use broker::{Broker, BrokerSettings, DeprovisionAck, Inspection, ProvisionAck};
pub use operation::OperationToken;
pub use plans::{PlanPolicy, PlanRegistry};
pub use policy::{PolicyField, PolicyViolation, ProvisionRequest};
pub use status::ProgressState;

use eb_infra::types::{NativeState, ResourceId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to find plan: {0}")]
    PlanNotFound(String),

    #[error("duplicate plan id: {0}")]
    DuplicatePlan(String),

    #[error(transparent)]
    PolicyViolation(#[from] PolicyViolation),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] eb_infra::Error),

    #[error("no resource is correlated with instance {0}")]
    NotFound(String),

    #[error("{count} live resources are correlated with instance {instance_id}")]
    AmbiguousMatch { instance_id: String, count: usize },

    #[error("instance {instance_id} is backed by resource {resource_id} in state {state}")]
    Unavailable {
        instance_id: String,
        resource_id: ResourceId,
        state: NativeState,
    },

    #[error("failed to tag resource {resource_id}, resource was terminated: {source}")]
    Tagging {
        resource_id: ResourceId,
        source: eb_infra::Error,
    },

    #[error(
        "failed to terminate resource {resource_id} after failing to tag it for instance \
         {instance_id}: {terminate_error} (tagging error: {tag_error}); manual cleanup required"
    )]
    CompensationFailure {
        instance_id: String,
        resource_id: ResourceId,
        tag_error: eb_infra::Error,
        terminate_error: eb_infra::Error,
    },

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Stable error categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    NotFound,
    Conflict,
    Upstream,
    Unimplemented,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlanNotFound(_) | Self::PolicyViolation(_) | Self::MalformedRequest(_) => {
                ErrorKind::BadInput
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AmbiguousMatch { .. } | Self::Unavailable { .. } => ErrorKind::Conflict,
            Self::Gateway(_) | Self::Tagging { .. } => ErrorKind::Upstream,
            Self::Unimplemented(_) => ErrorKind::Unimplemented,
            Self::DuplicatePlan(_) | Self::CompensationFailure { .. } => ErrorKind::Internal,
        }
    }

    /// An untagged resource may still exist at the provider.
    pub fn needs_operator(&self) -> bool {
        matches!(self, Self::CompensationFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compensation_failure_names_both_causes() {
        let err = Error::CompensationFailure {
            instance_id: "inst-1".into(),
            resource_id: ResourceId("r-1".into()),
            tag_error: eb_infra::Error::Ec2("tag throttled".into()),
            terminate_error: eb_infra::Error::Ec2("terminate denied".into()),
        };
        let msg = err.to_string();

        assert!(msg.contains("tag throttled"));
        assert!(msg.contains("terminate denied"));
        assert!(msg.contains("r-1"));
        assert!(err.needs_operator());
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn categories_cover_caller_taxonomy() {
        assert_eq!(Error::PlanNotFound("p".into()).kind(), ErrorKind::BadInput);
        assert_eq!(Error::NotFound("i".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::AmbiguousMatch { instance_id: "i".into(), count: 2 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            Error::Unavailable {
                instance_id: "i".into(),
                resource_id: ResourceId("r-1".into()),
                state: NativeState::new("stopped"),
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            Error::Gateway(eb_infra::Error::Ec2("boom".into())).kind(),
            ErrorKind::Upstream
        );
        assert_eq!(Error::Unimplemented("bind").kind(), ErrorKind::Unimplemented);
    }
}
