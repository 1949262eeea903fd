mod auth;
mod config;
mod dto;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use eb_broker::Broker;
use eb_infra::ec2::Ec2Gateway;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::routes::api_router;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().expect("failed to load broker configuration");

    let plans = config
        .broker
        .plan_registry()
        .expect("failed to build plan registry");
    tracing::info!(plans = plans.len(), "plan registry ready");

    // EC2
    let gateway = Ec2Gateway::connect(config.broker.region()).await;

    let broker = Broker::new(
        Arc::new(plans),
        Arc::new(gateway),
        config.broker.settings(),
        tracing::info_span!("ec2_broker", service_id = %config.broker.service_id),
    );

    let state = AppState {
        broker: Arc::new(broker),
        config: Arc::new(config.broker.clone()),
    };

    let app = api_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!(addr = %config.listen_addr, "starting service broker");

    axum::serve(listener, app).await.expect("server error");
}
