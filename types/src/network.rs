//! Network identifiers and descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Identifies a ledger network (e.g. `"polkadot"`, `"paseo"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkId(String);

impl NetworkId {
    /// Create a network id. Ids are non-empty and contain no whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(TypesError::InvalidNetworkId(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NetworkId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<NetworkId> for String {
    fn from(id: NetworkId) -> Self {
        id.0
    }
}

impl std::str::FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A registered network: its id, a display name, and candidate endpoints
/// in failover order (primary first).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub id: NetworkId,
    #[serde(rename = "name")]
    pub display_name: String,
    pub endpoints: Vec<String>,
}

impl NetworkDescriptor {
    pub fn new(id: NetworkId, display_name: impl Into<String>, endpoints: Vec<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            endpoints,
        }
    }

    /// The primary endpoint, if any.
    pub fn primary(&self) -> Option<&str> {
        self.endpoints.first().map(String::as_str)
    }

    /// Endpoints after the primary.
    pub fn fallbacks(&self) -> &[String] {
        self.endpoints.get(1..).unwrap_or(&[])
    }
}
