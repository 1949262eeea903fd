use std::sync::Arc;

use eb_broker::Broker;

use crate::config::BrokerConfig;

#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
    pub config: Arc<BrokerConfig>,
}
