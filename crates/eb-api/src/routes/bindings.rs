use axum::extract::Path;
use axum::http::StatusCode;

use crate::error::ApiError;

/// Instances are not bindable; the catalog advertises `bindable: false`.
pub async fn bind(
    Path((_instance_id, _binding_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    Err(eb_broker::Error::Unimplemented("bind").into())
}

pub async fn unbind(
    Path((_instance_id, _binding_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    Err(eb_broker::Error::Unimplemented("unbind").into())
}
