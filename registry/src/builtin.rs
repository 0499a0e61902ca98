//! Built-in network table.

use attest_types::{NetworkDescriptor, NetworkId};

use crate::RegistryError;

/// Network used when none is configured.
pub const DEFAULT_NETWORK: &str = "polkadot";

/// (id, display name, primary, fallbacks)
const BUILTIN: &[(&str, &str, &str, &[&str])] = &[
    (
        "polkadot",
        "Polkadot",
        "wss://rpc.polkadot.io",
        &["wss://polkadot.api.onfinality.io/public-ws"],
    ),
    (
        "kusama",
        "Kusama",
        "wss://kusama-rpc.polkadot.io",
        &["wss://kusama.api.onfinality.io/public-ws"],
    ),
    (
        "paseo",
        "Paseo (Testnet)",
        "wss://paseo.api.onfinality.io/public-ws",
        &["wss://paseo-rpc.publicnode.com"],
    ),
    (
        "paseo_backup",
        "Paseo (Testnet) - Backup",
        "wss://paseo-rpc.publicnode.com",
        &["wss://paseo.api.onfinality.io/public-ws"],
    ),
    (
        "acala",
        "Acala",
        "wss://acala-rpc.dwellir.com",
        &["wss://acala.api.onfinality.io/public-ws"],
    ),
    (
        "astar",
        "Astar",
        "wss://astar-rpc.dwellir.com",
        &["wss://astar.api.onfinality.io/public-ws"],
    ),
    (
        "moonbeam",
        "Moonbeam",
        "wss://wss.api.moonbeam.network",
        &["wss://moonbeam.public.blastapi.io"],
    ),
    (
        "statemint",
        "Statemint",
        "wss://statemint-rpc.polkadot.io",
        &["wss://statemint.api.onfinality.io/public-ws"],
    ),
];

/// Descriptors for every built-in network, in declaration order.
pub fn builtin_networks() -> Result<Vec<NetworkDescriptor>, RegistryError> {
    BUILTIN
        .iter()
        .map(|(id, name, primary, fallbacks)| {
            let id = NetworkId::new(*id).map_err(|e| RegistryError::InvalidEntry(e.to_string()))?;
            let endpoints = std::iter::once(*primary)
                .chain(fallbacks.iter().copied())
                .map(str::to_string)
                .collect();
            Ok(NetworkDescriptor::new(id, *name, endpoints))
        })
        .collect()
}
