use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Allow-lists and sizing for one catalog plan.
///
/// Field names on the wire follow the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPolicy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub instance_type: String,
    #[serde(rename = "allowed_amis", default)]
    pub allowed_images: BTreeSet<String>,
    #[serde(rename = "allowed_subnets", default)]
    pub allowed_networks: BTreeSet<String>,
    #[serde(default)]
    pub allowed_security_groups: BTreeSet<String>,
    #[serde(rename = "allow_public_ip", default)]
    pub allow_public_address: bool,
}

/// Immutable set of plans, built once at startup.
///
/// Plans keep their configured order so the catalog lists them the way the
/// operator wrote them.
#[derive(Debug, Clone, Default)]
pub struct PlanRegistry {
    plans: Vec<PlanPolicy>,
    index: HashMap<String, usize>,
}

impl PlanRegistry {
    pub fn new(plans: impl IntoIterator<Item = PlanPolicy>) -> Result<Self> {
        let mut registry = Self::default();
        for plan in plans {
            if registry.index.contains_key(&plan.id) {
                return Err(Error::DuplicatePlan(plan.id));
            }
            registry.index.insert(plan.id.clone(), registry.plans.len());
            registry.plans.push(plan);
        }
        Ok(registry)
    }

    pub fn lookup(&self, plan_id: &str) -> Result<&PlanPolicy> {
        self.index
            .get(plan_id)
            .map(|&i| &self.plans[i])
            .ok_or_else(|| Error::PlanNotFound(plan_id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanPolicy> {
        self.plans.iter()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(id: &str) -> PlanPolicy {
        PlanPolicy {
            id: id.into(),
            name: format!("{id}-name"),
            description: String::new(),
            instance_type: "t3.micro".into(),
            allowed_images: BTreeSet::new(),
            allowed_networks: BTreeSet::new(),
            allowed_security_groups: BTreeSet::new(),
            allow_public_address: false,
        }
    }

    #[test]
    fn looks_up_by_id_in_configured_order() {
        let registry = PlanRegistry::new([plan("small"), plan("large")]).unwrap();

        assert_eq!(registry.lookup("large").unwrap().name, "large-name");
        let ids: Vec<_> = registry.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["small", "large"]);
    }

    #[test]
    fn unknown_plan_is_reported() {
        let registry = PlanRegistry::new([plan("small")]).unwrap();
        assert!(matches!(registry.lookup("huge"), Err(Error::PlanNotFound(id)) if id == "huge"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = PlanRegistry::new([plan("small"), plan("small")]).unwrap_err();
        assert!(matches!(err, Error::DuplicatePlan(id) if id == "small"));
    }

    #[test]
    fn deserializes_configuration_record() {
        let plan: PlanPolicy = serde_json::from_str(
            r#"{
                "id": "p1",
                "name": "standard",
                "description": "one small instance",
                "instance_type": "t3.small",
                "allowed_amis": ["ami-1", "ami-2"],
                "allowed_subnets": ["sn-1"],
                "allowed_security_groups": ["sg-1"],
                "allow_public_ip": true
            }"#,
        )
        .unwrap();

        assert!(plan.allowed_images.contains("ami-2"));
        assert!(plan.allowed_networks.contains("sn-1"));
        assert!(plan.allow_public_address);
    }
}
