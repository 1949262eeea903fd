use eb_infra::types::NativeState;
use serde::{Deserialize, Serialize};

use crate::operation::OperationToken;

/// Progress of an asynchronous operation as the marketplace sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressState {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

/// Read a provider state in the light of the operation being polled.
///
/// Anything unrecognized is a failure for both operations.
pub fn translate(operation: OperationToken, state: &NativeState) -> ProgressState {
    match operation {
        OperationToken::Provision => match state.as_str() {
            NativeState::PENDING => ProgressState::InProgress,
            NativeState::RUNNING => ProgressState::Succeeded,
            _ => ProgressState::Failed,
        },
        OperationToken::Deprovision => match state.as_str() {
            NativeState::STOPPING | NativeState::SHUTTING_DOWN => ProgressState::InProgress,
            NativeState::STOPPED | NativeState::TERMINATED => ProgressState::Succeeded,
            _ => ProgressState::Failed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provision(state: &str) -> ProgressState {
        translate(OperationToken::Provision, &NativeState::new(state))
    }

    fn deprovision(state: &str) -> ProgressState {
        translate(OperationToken::Deprovision, &NativeState::new(state))
    }

    #[test]
    fn provision_mapping() {
        assert_eq!(provision("pending"), ProgressState::InProgress);
        assert_eq!(provision("running"), ProgressState::Succeeded);
        assert_eq!(provision("stopping"), ProgressState::Failed);
        assert_eq!(provision("stopped"), ProgressState::Failed);
        assert_eq!(provision("terminated"), ProgressState::Failed);
        assert_eq!(provision("unknown-state"), ProgressState::Failed);
    }

    #[test]
    fn deprovision_mapping() {
        assert_eq!(deprovision("stopping"), ProgressState::InProgress);
        assert_eq!(deprovision("shutting-down"), ProgressState::InProgress);
        assert_eq!(deprovision("stopped"), ProgressState::Succeeded);
        assert_eq!(deprovision("terminated"), ProgressState::Succeeded);
        assert_eq!(deprovision("running"), ProgressState::Failed);
        assert_eq!(deprovision("pending"), ProgressState::Failed);
        assert_eq!(deprovision("unknown-state"), ProgressState::Failed);
    }

    #[test]
    fn serializes_with_marketplace_names() {
        assert_eq!(
            serde_json::to_string(&ProgressState::InProgress).unwrap(),
            r#""in progress""#
        );
        assert_eq!(
            serde_json::to_string(&ProgressState::Succeeded).unwrap(),
            r#""succeeded""#
        );
    }
}
