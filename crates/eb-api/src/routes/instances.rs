use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use eb_broker::OperationToken;

use crate::dto::{
    AsyncQuery, LastOperationQuery, LastOperationResponse, OperationResponse, ProvisionBody,
    ProvisionParameters, ProvisionResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

fn malformed(reason: String) -> ApiError {
    eb_broker::Error::MalformedRequest(reason).into()
}

pub async fn provision_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
    body: Result<Json<ProvisionBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ProvisionResponse>), ApiError> {
    if !query.accepts_incomplete {
        return Err(ApiError::AsyncRequired);
    }

    let Json(body) = body.map_err(|e| malformed(e.body_text()))?;
    if body.service_id != state.config.service_id {
        return Err(malformed(format!("unknown service id: {}", body.service_id)));
    }

    let params: ProvisionParameters =
        serde_json::from_value(body.parameters.unwrap_or_default()).map_err(|e| {
            tracing::info!(instance_id, error = %e, "failed to parse provision parameters");
            malformed(format!("invalid parameters: {e}"))
        })?;
    let req = params.into_request(body.plan_id);

    let ack = state.broker.provision(&instance_id, &req).await?;

    let dashboard_url =
        (!state.config.dashboard_url.is_empty()).then(|| state.config.dashboard_url.clone());
    if ack.already_existed {
        return Ok((
            StatusCode::OK,
            Json(ProvisionResponse {
                dashboard_url,
                operation: None,
            }),
        ));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(ProvisionResponse {
            dashboard_url,
            operation: Some(ack.operation.to_string()),
        }),
    ))
}

/// Plans are not updatable.
pub async fn update_instance(Path(_instance_id): Path<String>) -> Result<StatusCode, ApiError> {
    Err(ApiError::PlanChangeNotSupported)
}

pub async fn deprovision_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
) -> Result<(StatusCode, Json<OperationResponse>), ApiError> {
    if !query.accepts_incomplete {
        return Err(ApiError::AsyncRequired);
    }

    match state.broker.deprovision(&instance_id).await {
        Ok(ack) => Ok((
            StatusCode::ACCEPTED,
            Json(OperationResponse {
                operation: ack.operation.to_string(),
            }),
        )),
        Err(eb_broker::Error::NotFound(_)) => Err(ApiError::Gone),
        Err(e) => Err(e.into()),
    }
}

pub async fn last_operation(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<LastOperationQuery>,
) -> Result<Json<LastOperationResponse>, ApiError> {
    let token = query.operation.as_deref();

    match state.broker.inspect(&instance_id, token).await {
        Ok(inspection) => Ok(Json(LastOperationResponse {
            state: inspection.state,
            description: inspection.description,
        })),
        // A finished deprovision eventually disappears from the provider.
        Err(eb_broker::Error::NotFound(_))
            if token == Some(OperationToken::Deprovision.as_str()) =>
        {
            Err(ApiError::Gone)
        }
        Err(e) => Err(e.into()),
    }
}
