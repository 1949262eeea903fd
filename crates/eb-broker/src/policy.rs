use std::fmt;

use serde::{Deserialize, Serialize};

use crate::plans::PlanPolicy;

/// What the caller asked for, as parsed from the provision parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub plan_id: String,
    pub image: String,
    pub network: String,
    pub security_group: String,
    pub public_address: bool,
}

/// Which plan constraint a request broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyField {
    Image,
    Network,
    SecurityGroup,
    PublicAddress,
}

impl PolicyField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Network => "network",
            Self::SecurityGroup => "security_group",
            Self::PublicAddress => "public_address",
        }
    }
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    pub field: PolicyField,
    pub value: String,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            PolicyField::Image => write!(f, "attempt to start disallowed image: {}", self.value),
            PolicyField::Network => {
                write!(f, "attempt to start instance in disallowed subnet: {}", self.value)
            }
            PolicyField::SecurityGroup => write!(
                f,
                "attempt to start instance in disallowed security group: {}",
                self.value
            ),
            PolicyField::PublicAddress => {
                f.write_str("attempt to start instance with a public IP while plan does not allow it")
            }
        }
    }
}

impl std::error::Error for PolicyViolation {}

/// Check a request against a plan's allow-lists. Reports the first failure
/// in order: image, network, security group, public address.
pub fn validate(policy: &PlanPolicy, req: &ProvisionRequest) -> Result<(), PolicyViolation> {
    let checks = [
        (PolicyField::Image, &req.image, &policy.allowed_images),
        (PolicyField::Network, &req.network, &policy.allowed_networks),
        (
            PolicyField::SecurityGroup,
            &req.security_group,
            &policy.allowed_security_groups,
        ),
    ];

    for (field, value, allowed) in checks {
        if !allowed.contains(value) {
            return Err(PolicyViolation {
                field,
                value: value.clone(),
            });
        }
    }

    if req.public_address && !policy.allow_public_address {
        return Err(PolicyViolation {
            field: PolicyField::PublicAddress,
            value: "true".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn policy(allow_public_address: bool) -> PlanPolicy {
        PlanPolicy {
            id: "p1".into(),
            name: "standard".into(),
            description: String::new(),
            instance_type: "t3.micro".into(),
            allowed_images: set(&["ami-1", "ami-2"]),
            allowed_networks: set(&["sn-1"]),
            allowed_security_groups: set(&["sg-1"]),
            allow_public_address,
        }
    }

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            plan_id: "p1".into(),
            image: "ami-1".into(),
            network: "sn-1".into(),
            security_group: "sg-1".into(),
            public_address: false,
        }
    }

    #[test]
    fn accepts_request_inside_allow_lists() {
        assert_eq!(validate(&policy(false), &request()), Ok(()));

        let public = ProvisionRequest { public_address: true, ..request() };
        assert_eq!(validate(&policy(true), &public), Ok(()));
    }

    #[test]
    fn names_the_offending_field_and_value() {
        let cases = [
            (ProvisionRequest { image: "ami-9".into(), ..request() }, PolicyField::Image, "ami-9"),
            (ProvisionRequest { network: "sn-9".into(), ..request() }, PolicyField::Network, "sn-9"),
            (
                ProvisionRequest { security_group: "sg-9".into(), ..request() },
                PolicyField::SecurityGroup,
                "sg-9",
            ),
        ];

        for (req, field, value) in cases {
            let violation = validate(&policy(true), &req).unwrap_err();
            assert_eq!(violation.field, field);
            assert_eq!(violation.value, value);
        }
    }

    #[test]
    fn public_address_needs_plan_permission() {
        let req = ProvisionRequest { public_address: true, ..request() };
        let violation = validate(&policy(false), &req).unwrap_err();

        assert_eq!(violation.field, PolicyField::PublicAddress);
        assert!(violation.to_string().contains("public IP"));
    }

    #[test]
    fn reports_image_before_other_fields() {
        let req = ProvisionRequest {
            image: "ami-9".into(),
            network: "sn-9".into(),
            public_address: true,
            ..request()
        };
        assert_eq!(validate(&policy(false), &req).unwrap_err().field, PolicyField::Image);
    }
}
