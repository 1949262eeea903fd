use axum::Json;
use axum::extract::State;

use crate::dto::{CatalogResponse, PlanResponse, ServiceResponse};
use crate::state::AppState;

/// The single configured service with every plan from the registry.
pub async fn get_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let config = &state.config;
    let plans = state.broker.plans().iter().map(PlanResponse::from).collect();

    Json(CatalogResponse {
        services: vec![ServiceResponse {
            id: config.service_id.clone(),
            name: config.service_name.clone(),
            description: config.service_description.clone(),
            bindable: false,
            plan_updateable: false,
            plans,
        }],
    })
}
