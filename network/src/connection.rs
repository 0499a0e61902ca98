//! Connection management: the single live link per process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use attest_registry::NetworkRegistry;
use attest_types::{NetworkDescriptor, NetworkId};

use crate::{ConnectionError, LedgerLink, Transport};

/// Default time allowed for one endpoint to become ready.
pub const PER_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default time allowed for the whole failover sequence.
pub const OVERALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectOptions {
    pub per_endpoint_timeout: Duration,
    pub overall_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            per_endpoint_timeout: PER_ENDPOINT_TIMEOUT,
            overall_timeout: OVERALL_TIMEOUT,
        }
    }
}

/// An established link to one endpoint of a network.
///
/// Clones share the live flag; once the manager tears the connection down
/// every clone observes `is_live() == false`.
#[derive(Clone)]
pub struct Connection {
    network_id: NetworkId,
    endpoint: String,
    link: Arc<dyn LedgerLink>,
    live: Arc<AtomicBool>,
}

impl Connection {
    fn new(network_id: NetworkId, endpoint: String, link: Arc<dyn LedgerLink>) -> Self {
        Self {
            network_id,
            endpoint,
            link,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn network_id(&self) -> &NetworkId {
        &self.network_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn link(&self) -> &Arc<dyn LedgerLink> {
        &self.link
    }

    /// Live until torn down, and only while the link itself is up.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst) && self.link.is_connected()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("network_id", &self.network_id)
            .field("endpoint", &self.endpoint)
            .field("live", &self.live.load(Ordering::SeqCst))
            .finish()
    }
}

struct EndpointAttempt {
    endpoint: String,
    error: Option<String>,
}

/// Owns the process's one live connection.
///
/// Establishing a new connection always tears the previous one down first,
/// so two links are never live at once.
pub struct ConnectionManager {
    registry: Arc<NetworkRegistry>,
    transport: Arc<dyn Transport>,
    current: Option<Connection>,
}

impl ConnectionManager {
    pub fn new(registry: Arc<NetworkRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
            current: None,
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Connect to `network_id`, trying its endpoints strictly in order.
    ///
    /// A live connection to the same network is reused. Any other
    /// connection is torn down before the first endpoint is attempted.
    pub async fn connect(
        &mut self,
        network_id: &NetworkId,
        options: &ConnectOptions,
    ) -> Result<Connection, ConnectionError> {
        let descriptor = self.registry.resolve(network_id)?.clone();
        if let Some(current) = &self.current {
            if current.network_id() == network_id && current.is_live() {
                tracing::debug!(network = %network_id, endpoint = %current.endpoint(), "reusing live connection");
                return Ok(current.clone());
            }
        }
        self.disconnect().await;
        self.establish(&descriptor, options).await
    }

    /// Tear down the current connection, then connect to `network_id`.
    ///
    /// On failure the manager is left disconnected.
    pub async fn switch_network(
        &mut self,
        network_id: &NetworkId,
        options: &ConnectOptions,
    ) -> Result<Connection, ConnectionError> {
        self.disconnect().await;
        let descriptor = self.registry.resolve(network_id)?.clone();
        self.establish(&descriptor, options).await
    }

    /// Tear down the current connection, if any. Waits for the link to close.
    pub async fn disconnect(&mut self) {
        let Some(conn) = self.current.take() else {
            return;
        };
        conn.live.store(false, Ordering::SeqCst);
        if let Err(e) = conn.link.close().await {
            tracing::warn!(network = %conn.network_id, endpoint = %conn.endpoint, error = %e, "error closing link");
        }
        tracing::info!(network = %conn.network_id, endpoint = %conn.endpoint, "disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.current.as_ref().is_some_and(Connection::is_live)
    }

    pub fn current(&self) -> Option<&Connection> {
        self.current.as_ref()
    }

    pub fn current_network(&self) -> Option<&NetworkId> {
        self.current.as_ref().map(Connection::network_id)
    }

    async fn establish(
        &mut self,
        descriptor: &NetworkDescriptor,
        options: &ConnectOptions,
    ) -> Result<Connection, ConnectionError> {
        let mut attempts = Vec::with_capacity(descriptor.endpoints.len());
        let outcome = tokio::time::timeout(
            options.overall_timeout,
            try_endpoints(self.transport.as_ref(), descriptor, options, &mut attempts),
        )
        .await;

        match outcome {
            Ok(Some(conn)) => {
                self.current = Some(conn.clone());
                Ok(conn)
            }
            Ok(None) => {
                tracing::error!(network = %descriptor.id, tried = attempts.len(), "all endpoints failed");
                let (tried_endpoints, last_errors) = attempts
                    .into_iter()
                    .map(|a| (a.endpoint, a.error.unwrap_or_default()))
                    .unzip();
                Err(ConnectionError::NoEndpointsAvailable {
                    network_id: descriptor.id.clone(),
                    tried_endpoints,
                    last_errors,
                })
            }
            Err(_) => {
                tracing::error!(network = %descriptor.id, timeout = ?options.overall_timeout, "connection attempts timed out");
                Err(ConnectionError::Timeout {
                    network_id: descriptor.id.clone(),
                    tried_endpoints: attempts.into_iter().map(|a| a.endpoint).collect(),
                    timeout: options.overall_timeout,
                })
            }
        }
    }
}

async fn try_endpoints(
    transport: &dyn Transport,
    descriptor: &NetworkDescriptor,
    options: &ConnectOptions,
    attempts: &mut Vec<EndpointAttempt>,
) -> Option<Connection> {
    for endpoint in &descriptor.endpoints {
        tracing::debug!(network = %descriptor.id, endpoint = %endpoint, "attempting endpoint");
        attempts.push(EndpointAttempt {
            endpoint: endpoint.clone(),
            error: None,
        });

        let error = match tokio::time::timeout(options.per_endpoint_timeout, transport.open(endpoint)).await {
            Ok(Ok(link)) => {
                tracing::info!(network = %descriptor.id, endpoint = %endpoint, "connected");
                return Some(Connection::new(descriptor.id.clone(), endpoint.clone(), link));
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("no response within {:?}", options.per_endpoint_timeout),
        };

        tracing::warn!(network = %descriptor.id, endpoint = %endpoint, error = %error, "endpoint failed");
        if let Some(last) = attempts.last_mut() {
            last.error = Some(error);
        }
    }
    None
}
