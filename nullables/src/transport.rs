//! Nullable transport: scripted endpoint outcomes, recorded attempts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use attest_network::{LedgerLink, LinkError, Transport};

use crate::NullLink;

/// How an endpoint answers an `open`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndpointBehavior {
    Accept,
    Refuse(String),
    /// Never answers; only a timeout gets the caller out.
    Hang,
}

/// A test transport. Endpoints accept by default.
#[derive(Default)]
pub struct NullTransport {
    behaviors: Mutex<HashMap<String, EndpointBehavior>>,
    prepared: Mutex<HashMap<String, Arc<NullLink>>>,
    attempts: Mutex<Vec<String>>,
    opened: Mutex<Vec<Arc<NullLink>>>,
    max_live: AtomicUsize,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, endpoint: &str, reason: &str) {
        self.set(endpoint, EndpointBehavior::Refuse(reason.to_string()));
    }

    pub fn hang(&self, endpoint: &str) {
        self.set(endpoint, EndpointBehavior::Hang);
    }

    pub fn accept(&self, endpoint: &str) {
        self.set(endpoint, EndpointBehavior::Accept);
    }

    fn set(&self, endpoint: &str, behavior: EndpointBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), behavior);
    }

    /// Hand out `link` the next time its endpoint is opened.
    pub fn prepare(&self, link: Arc<NullLink>) {
        self.prepared
            .lock()
            .unwrap()
            .insert(link.endpoint().to_string(), link);
    }

    /// Endpoints passed to `open`, in call order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Every link handed out so far.
    pub fn opened(&self) -> Vec<Arc<NullLink>> {
        self.opened.lock().unwrap().clone()
    }

    /// The most recently handed-out link.
    pub fn last_link(&self) -> Option<Arc<NullLink>> {
        self.opened.lock().unwrap().last().cloned()
    }

    /// Links handed out that are still connected.
    pub fn live_links(&self) -> usize {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.is_connected())
            .count()
    }

    /// Highest number of simultaneously live links ever observed.
    pub fn max_live_links(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for NullTransport {
    async fn open(&self, endpoint: &str) -> Result<Arc<dyn LedgerLink>, LinkError> {
        self.attempts.lock().unwrap().push(endpoint.to_string());
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or(EndpointBehavior::Accept);

        match behavior {
            EndpointBehavior::Accept => {}
            EndpointBehavior::Refuse(reason) => return Err(LinkError::Connect(reason)),
            EndpointBehavior::Hang => return std::future::pending().await,
        }

        let link = self
            .prepared
            .lock()
            .unwrap()
            .remove(endpoint)
            .unwrap_or_else(|| Arc::new(NullLink::new(endpoint)));

        let live = {
            let mut opened = self.opened.lock().unwrap();
            opened.push(Arc::clone(&link));
            opened.iter().filter(|l| l.is_connected()).count()
        };
        self.max_live.fetch_max(live, Ordering::SeqCst);
        Ok(link)
    }
}
