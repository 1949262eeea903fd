use eb_broker::{PlanPolicy, ProgressState, ProvisionRequest};
use serde::{Deserialize, Serialize};

// ── Requests ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProvisionBody {
    pub service_id: String,
    pub plan_id: String,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

/// Caller-chosen launch parameters, carried in `parameters`.
#[derive(Debug, Deserialize)]
pub struct ProvisionParameters {
    pub ami_id: String,
    pub subnet_id: String,
    pub security_group_id: String,
    #[serde(default)]
    pub assign_public_ip: bool,
}

impl ProvisionParameters {
    pub fn into_request(self, plan_id: String) -> ProvisionRequest {
        ProvisionRequest {
            plan_id,
            image: self.ami_id,
            network: self.subnet_id,
            security_group: self.security_group_id,
            public_address: self.assign_public_ip,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AsyncQuery {
    #[serde(default)]
    pub accepts_incomplete: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LastOperationQuery {
    pub operation: Option<String>,
}

// ── Responses ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub services: Vec<ServiceResponse>,
}

#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bindable: bool,
    pub plan_updateable: bool,
    pub plans: Vec<PlanResponse>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<&PlanPolicy> for PlanResponse {
    fn from(p: &PlanPolicy) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProvisionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub operation: String,
}

#[derive(Debug, Serialize)]
pub struct LastOperationResponse {
    pub state: ProgressState,
    pub description: String,
}
