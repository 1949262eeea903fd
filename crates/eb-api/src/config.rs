use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use eb_broker::{BrokerSettings, PlanPolicy, PlanRegistry};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse broker configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid broker configuration: {0}")]
    Invalid(String),

    #[error("invalid plan configuration: {0}")]
    Plans(#[from] eb_broker::Error),

    #[error("invalid listen address: {0}")]
    ListenAddr(String),
}

/// The broker's configuration document: one service, many plans.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub dashboard_url: String,
    #[serde(default)]
    pub region: String,
    pub service_id: String,
    pub service_name: String,
    #[serde(default)]
    pub service_description: String,
    #[serde(default)]
    pub broker_username: String,
    #[serde(default)]
    pub broker_password: String,
    pub keypair_name: String,
    #[serde(default)]
    pub tag_prefix: String,
    pub plans: Vec<PlanPolicy>,
}

impl BrokerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Let the environment supply broker credentials instead of the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(user) = lookup("BROKER_USERNAME") {
            self.broker_username = user;
        }
        if let Some(password) = lookup("BROKER_PASSWORD") {
            self.broker_password = password;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_id.is_empty() || self.service_name.is_empty() {
            return Err(ConfigError::Invalid("service_id and service_name must be set".into()));
        }
        if self.broker_username.is_empty() || self.broker_password.is_empty() {
            return Err(ConfigError::Invalid("broker credentials must be set".into()));
        }
        if self.keypair_name.is_empty() {
            return Err(ConfigError::Invalid("keypair_name must be set".into()));
        }
        if self.plans.is_empty() {
            return Err(ConfigError::Invalid("at least one plan is required".into()));
        }
        self.plan_registry()?;
        Ok(())
    }

    pub fn plan_registry(&self) -> eb_broker::Result<PlanRegistry> {
        PlanRegistry::new(self.plans.iter().cloned())
    }

    pub fn settings(&self) -> BrokerSettings {
        BrokerSettings {
            tag_prefix: self.tag_prefix.clone(),
            key_pair: self.keypair_name.clone(),
        }
    }

    /// Empty means "let the AWS SDK resolve it".
    pub fn region(&self) -> Option<String> {
        (!self.region.is_empty()).then(|| self.region.clone())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub broker: BrokerConfig,
}

impl AppConfig {
    /// - `BROKER_CONFIG` (default: `config.json`)
    /// - `LISTEN_ADDR` (default: `0.0.0.0:$PORT`, `PORT` default `8000`)
    /// - `BROKER_USERNAME` / `BROKER_PASSWORD` (override the file)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup("BROKER_CONFIG").unwrap_or_else(|| "config.json".into());
        let mut broker = BrokerConfig::load(Path::new(&path))?;
        broker.apply_overrides(&lookup);
        broker.validate()?;

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(addr) => addr,
            None => format!("0.0.0.0:{}", lookup("PORT").unwrap_or_else(|| "8000".into())),
        };
        let listen_addr = listen_addr
            .parse()
            .map_err(|_| ConfigError::ListenAddr(listen_addr))?;

        Ok(Self { listen_addr, broker })
    }
}
