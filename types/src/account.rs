//! Signing accounts exposed by the signing delegate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An account the signing delegate can sign with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Ledger address (SS58 or equivalent).
    pub address: String,
    /// Human-readable name from the provider; may be empty.
    pub label: String,
}

impl Account {
    pub fn new(address: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            f.write_str(&self.address)
        } else {
            write!(f, "{} ({})", self.label, self.address)
        }
    }
}
