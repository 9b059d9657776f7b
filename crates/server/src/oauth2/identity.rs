//! Test identities that authorization codes and tokens are bound to.
//!
//! Identity ids are Discord-style snowflakes and may be longer than any native
//! integer type, so they are kept as validated decimal strings and never parsed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Decimal identifier of a test identity, serialized as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "999999999")]
pub struct IdentityId(String);

impl IdentityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity bound to codes minted for an unrecognized `selected_user` key.
    pub fn sentinel() -> Self {
        Self("0".to_string())
    }
}

impl FromStr for IdentityId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("identity id must not be empty".into());
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("identity id must be decimal digits, got {s:?}"));
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(format!("identity id must not have leading zeros, got {s:?}"));
        }
        Ok(Self(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for IdentityId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the authorize endpoint picks the identity a code is bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// Every code is bound to the registry's default identity.
    #[default]
    Single,
    /// The user picks an identity from an HTML form first.
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Form value submitted as `selected_user`.
    pub key: String,
    /// Label shown in the account picker.
    pub label: String,
    pub id: IdentityId,
}

/// Fixed set of test identities.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    identities: Vec<Identity>,
}

impl IdentityRegistry {
    /// Builds a registry. The first entry is the default identity.
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    pub fn default_identity(&self) -> IdentityId {
        self.identities
            .first()
            .map(|identity| identity.id.clone())
            .unwrap_or_else(IdentityId::sentinel)
    }

    /// Resolves a `selected_user` key, falling back to the sentinel identity.
    pub fn resolve(&self, key: &str) -> IdentityId {
        match self.identities.iter().find(|identity| identity.key == key) {
            Some(identity) => identity.id.clone(),
            None => {
                tracing::debug!(selected_user = key, "unknown identity key, using sentinel");
                IdentityId::sentinel()
            }
        }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        let fixture = |key: &str, label: &str, id: &str| Identity {
            key: key.to_string(),
            label: label.to_string(),
            id: IdentityId(id.to_string()),
        };
        Self::new(vec![
            fixture("mocked_user", "MockedUser", "999999999"),
            fixture("snowflake_user", "SnowflakeUser", "80351110224678912"),
            fixture("wide_user", "WideUser", "123456789012345678901234567890"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_wider_than_u64() {
        let id: IdentityId = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(id.as_str(), "123456789012345678901234567890");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"123456789012345678901234567890\""
        );
    }

    #[test]
    fn rejects_non_decimal_ids() {
        assert!("".parse::<IdentityId>().is_err());
        assert!("12a".parse::<IdentityId>().is_err());
        assert!("-5".parse::<IdentityId>().is_err());
        assert!("007".parse::<IdentityId>().is_err());
        assert!("0".parse::<IdentityId>().is_ok());
    }

    #[test]
    fn deserializes_only_strings() {
        let id: IdentityId = serde_json::from_str("\"80351110224678912\"").unwrap();
        assert_eq!(id.to_string(), "80351110224678912");
        assert!(serde_json::from_str::<IdentityId>("80351110224678912").is_err());
    }

    #[test]
    fn registry_resolves_known_and_unknown_keys() {
        let registry = IdentityRegistry::default();
        assert_eq!(registry.default_identity().as_str(), "999999999");
        assert_eq!(registry.resolve("snowflake_user").as_str(), "80351110224678912");
        assert_eq!(registry.resolve("nobody"), IdentityId::sentinel());
    }

    #[test]
    fn empty_registry_defaults_to_sentinel() {
        let registry = IdentityRegistry::new(Vec::new());
        assert_eq!(registry.default_identity(), IdentityId::sentinel());
    }
}
