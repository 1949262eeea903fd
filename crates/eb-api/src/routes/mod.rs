pub mod bindings;
pub mod catalog;
pub mod instances;

use axum::Router;
use axum::middleware;
use axum::routing::{get, put};

use crate::auth::auth_middleware;
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Catalog
        .route("/v2/catalog", get(catalog::get_catalog))
        // Instance lifecycle
        .route(
            "/v2/service_instances/{instance_id}",
            put(instances::provision_instance)
                .patch(instances::update_instance)
                .delete(instances::deprovision_instance),
        )
        .route(
            "/v2/service_instances/{instance_id}/last_operation",
            get(instances::last_operation),
        )
        // Bindings
        .route(
            "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
            put(bindings::bind).delete(bindings::unbind),
        )
        // Auth middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
