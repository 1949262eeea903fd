use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Handed back after an asynchronous operation and echoed on every poll.
///
/// On the wire it is the literal `"provision"` or `"deprovision"`; it only
/// selects how provider states are read, the current state itself always
/// comes from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationToken {
    Provision,
    Deprovision,
}

impl OperationToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provision => "provision",
            Self::Deprovision => "deprovision",
        }
    }

    /// Parse a token as echoed by the caller; absence is malformed.
    pub fn parse_echoed(raw: Option<&str>) -> Result<Self, Error> {
        raw.ok_or_else(|| Error::MalformedRequest("missing operation token".into()))?
            .parse()
    }
}

impl fmt::Display for OperationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "provision" => Ok(Self::Provision),
            "deprovision" => Ok(Self::Deprovision),
            other => Err(Error::MalformedRequest(format!(
                "unknown operation token: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for token in [OperationToken::Provision, OperationToken::Deprovision] {
            assert_eq!(token.to_string().parse::<OperationToken>().unwrap(), token);
        }
    }

    #[test]
    fn missing_or_unknown_token_is_malformed() {
        assert!(matches!(
            OperationToken::parse_echoed(None),
            Err(Error::MalformedRequest(_))
        ));
        assert!(matches!(
            OperationToken::parse_echoed(Some("")),
            Err(Error::MalformedRequest(_))
        ));
        assert!(matches!(
            OperationToken::parse_echoed(Some("p_instance-1")),
            Err(Error::MalformedRequest(_))
        ));
    }
}
