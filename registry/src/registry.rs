//! Network registry: resolve a network id to its endpoints.

use attest_types::{NetworkDescriptor, NetworkId};

use crate::builtin::{builtin_networks, DEFAULT_NETWORK};
use crate::RegistryError;

/// Read-only table of known networks.
///
/// Declaration order is preserved for listing; endpoint order inside each
/// descriptor is the failover order.
#[derive(Clone, Debug)]
pub struct NetworkRegistry {
    networks: Vec<NetworkDescriptor>,
    default: NetworkId,
}

impl NetworkRegistry {
    /// Build a registry, validating that ids are unique, every network has at
    /// least one endpoint, and the default is registered.
    pub fn new(networks: Vec<NetworkDescriptor>, default: NetworkId) -> Result<Self, RegistryError> {
        for (i, desc) in networks.iter().enumerate() {
            if desc.endpoints.is_empty() {
                return Err(RegistryError::NoEndpoints(desc.id.to_string()));
            }
            if networks[..i].iter().any(|d| d.id == desc.id) {
                return Err(RegistryError::DuplicateNetwork(desc.id.to_string()));
            }
        }
        if !networks.iter().any(|d| d.id == default) {
            return Err(RegistryError::UnknownNetwork(default.to_string()));
        }
        Ok(Self { networks, default })
    }

    /// The built-in table with `polkadot` as default.
    pub fn builtin() -> Result<Self, RegistryError> {
        let default =
            NetworkId::new(DEFAULT_NETWORK).map_err(|e| RegistryError::InvalidEntry(e.to_string()))?;
        Self::new(builtin_networks()?, default)
    }

    /// Merge `extra` over this registry: entries with a known id replace the
    /// existing descriptor in place, new ids are appended. `default`, when
    /// given, becomes the new default.
    pub fn with_overrides(
        self,
        extra: Vec<NetworkDescriptor>,
        default: Option<NetworkId>,
    ) -> Result<Self, RegistryError> {
        let mut networks = self.networks;
        for desc in extra {
            match networks.iter_mut().find(|d| d.id == desc.id) {
                Some(existing) => *existing = desc,
                None => networks.push(desc),
            }
        }
        Self::new(networks, default.unwrap_or(self.default))
    }

    /// Look up a network by id.
    pub fn resolve(&self, id: &NetworkId) -> Result<&NetworkDescriptor, RegistryError> {
        self.networks
            .iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| RegistryError::UnknownNetwork(id.to_string()))
    }

    pub fn default_network(&self) -> &NetworkId {
        &self.default
    }

    /// All networks in declaration order.
    pub fn networks(&self) -> impl Iterator<Item = &NetworkDescriptor> {
        self.networks.iter()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
