//! Process-wide wiring.

use std::sync::Arc;

use attest_network::{Connection, ConnectionManager, SigningDelegate, Transport, WsTransport};
use attest_registry::NetworkRegistry;
use attest_types::{Clock, SystemClock};
use attest_verification::VerificationService;

use crate::{ClientConfig, ClientError};

/// Owns the registry and the single verification service (and through it
/// the single connection manager) for a process.
pub struct AttestContext {
    config: ClientConfig,
    registry: Arc<NetworkRegistry>,
    service: Arc<VerificationService>,
}

impl AttestContext {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        signer: Option<Arc<dyn SigningDelegate>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let registry = Arc::new(config.registry()?);
        let manager = ConnectionManager::new(Arc::clone(&registry), transport);
        let service = Arc::new(VerificationService::new(
            manager,
            signer,
            clock,
            config.service_options(),
        ));
        tracing::debug!(
            networks = registry.len(),
            default = %registry.default_network(),
            "context initialised"
        );
        Ok(Self {
            config,
            registry,
            service,
        })
    }

    /// Real WebSocket transport and system clock.
    pub fn websocket(
        config: ClientConfig,
        signer: Option<Arc<dyn SigningDelegate>>,
    ) -> Result<Self, ClientError> {
        Self::new(config, Arc::new(WsTransport::default()), signer, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn service(&self) -> &Arc<VerificationService> {
        &self.service
    }

    /// Connect to the configured network (or the registry default).
    pub async fn start(&self) -> Result<Connection, ClientError> {
        Ok(self.service.connect(self.config.network.as_ref()).await?)
    }
}
