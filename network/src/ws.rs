//! WebSocket JSON-RPC transport for Substrate-style nodes.
//!
//! One reader task per link routes responses to waiting callers by request
//! id and subscription notifications to their channels by subscription id.
//! A link counts as ready once it has answered a `system_chain` request.
//!
//! Each submission is followed by its own task, which reads the block's
//! events on inclusion to tell a failed call from a successful one and drops
//! the subscription once the operation is settled.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use attest_crypto::operation_reference;

use crate::scale::{extrinsic_failure, trailing_byte_args};
use crate::{ActivityItem, ChainHead, LedgerLink, LinkError, OperationStatus, OperationWatch, Transport};

/// Default time a single request may wait for its response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const STATUS_BUFFER: usize = 16;

/// Storage key of `System.Events`: `twox128("System") ++ twox128("Events")`.
const SYSTEM_EVENTS_KEY: &str = "0x26aa394eea5630e07c48ae0c9558cef780d41e5e16056765bc8461851072c9d7";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Opens [`WsLink`]s.
#[derive(Clone, Debug)]
pub struct WsTransport {
    request_timeout: Duration,
}

impl WsTransport {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new(REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, endpoint: &str) -> Result<Arc<dyn LedgerLink>, LinkError> {
        let link = WsLink::connect(endpoint, self.request_timeout).await?;
        Ok(Arc::new(link))
    }
}

struct PendingCall {
    reply: oneshot::Sender<Result<Value, LinkError>>,
    /// Registered under the returned subscription id before the reply is
    /// delivered, so no early notification is lost.
    subscription: Option<mpsc::UnboundedSender<Value>>,
}

#[derive(Default)]
struct Router {
    calls: Mutex<HashMap<u64, PendingCall>>,
    subscriptions: Mutex<HashMap<String, mpsc::UnboundedSender<Value>>>,
    connected: AtomicBool,
}

impl Router {
    /// Stop routing notifications for `subscription`. Returns whether it was
    /// still registered.
    async fn forget(&self, subscription: &str) -> bool {
        self.subscriptions.lock().await.remove(subscription).is_some()
    }
}

/// Request plumbing shared by a link and the tasks following its
/// submissions.
struct Rpc {
    endpoint: String,
    sink: Arc<Mutex<WsSink>>,
    router: Arc<Router>,
    next_id: AtomicU64,
    request_timeout: Duration,
}

impl Rpc {
    fn is_connected(&self) -> bool {
        self.router.connected.load(Ordering::SeqCst)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, LinkError> {
        self.call_with_subscription(method, params, None).await
    }

    async fn call_with_subscription(
        &self,
        method: &str,
        params: Value,
        subscription: Option<mpsc::UnboundedSender<Value>>,
    ) -> Result<Value, LinkError> {
        if !self.is_connected() {
            return Err(LinkError::Closed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, response) = oneshot::channel();
        self.router
            .calls
            .lock()
            .await
            .insert(id, PendingCall { reply, subscription });

        let frame = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        trace!(endpoint = %self.endpoint, id, method, "rpc request");
        let sent = self.sink.lock().await.send(Message::Text(frame.to_string())).await;
        if let Err(e) = sent {
            self.router.calls.lock().await.remove(&id);
            return Err(LinkError::Io(e.to_string()));
        }

        match tokio::time::timeout(self.request_timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(LinkError::Closed),
            Err(_) => {
                self.router.calls.lock().await.remove(&id);
                Err(LinkError::Timeout(format!("{method} after {:?}", self.request_timeout)))
            }
        }
    }

    async fn header(&self, block_hash: &str) -> Result<Value, LinkError> {
        match self.call("chain_getHeader", json!([block_hash])).await? {
            Value::Null => Err(LinkError::InvalidResponse(format!("unknown block {block_hash}"))),
            header => Ok(header),
        }
    }

    async fn best_hash(&self) -> Result<String, LinkError> {
        let hash = self.call("chain_getBlockHash", json!([])).await?;
        hash.as_str()
            .map(str::to_string)
            .ok_or_else(|| LinkError::InvalidResponse(format!("block hash {hash}")))
    }

    /// `DispatchFailed` if `extrinsic` is in `block_hash` and its call failed
    /// there. Inclusion statuses do not say whether the call succeeded; only
    /// the block's `System.Events` do.
    async fn dispatch_failure(
        &self,
        block_hash: &str,
        extrinsic: &str,
    ) -> Result<Option<OperationStatus>, LinkError> {
        let signed = self.call("chain_getBlock", json!([block_hash])).await?;
        let position = signed["block"]["extrinsics"].as_array().and_then(|extrinsics| {
            extrinsics
                .iter()
                .position(|x| x.as_str().is_some_and(|x| x.eq_ignore_ascii_case(extrinsic)))
        });
        let Some(position) = position else {
            debug!(endpoint = %self.endpoint, block = %block_hash, "extrinsic not found in its block");
            return Ok(None);
        };
        let index = u32::try_from(position)
            .map_err(|e| LinkError::InvalidResponse(format!("extrinsic index {position}: {e}")))?;

        let events = self
            .call("state_getStorage", json!([SYSTEM_EVENTS_KEY, block_hash]))
            .await?;
        let Some(events) = events.as_str() else {
            return Ok(None);
        };
        let events = hex::decode(events.trim_start_matches("0x"))
            .map_err(|e| LinkError::InvalidResponse(format!("events of {block_hash}: {e}")))?;
        Ok(extrinsic_failure(&events, index))
    }

    /// Stop following a submission. The node ends the subscription itself
    /// after a terminal status; otherwise it is told to.
    async fn release(&self, subscription: &str, unwatch: bool) {
        self.router.forget(subscription).await;
        if !unwatch {
            return;
        }
        if let Err(e) = self.call("author_unwatchExtrinsic", json!([subscription])).await {
            debug!(endpoint = %self.endpoint, subscription, error = %e, "unwatch failed");
        }
    }
}

/// A JSON-RPC link over one WebSocket.
pub struct WsLink {
    rpc: Arc<Rpc>,
    reader: JoinHandle<()>,
}

impl WsLink {
    /// Connect and wait for the readiness check to succeed.
    pub async fn connect(endpoint: &str, request_timeout: Duration) -> Result<Self, LinkError> {
        let (stream, _response) = tokio_tungstenite::connect_async(endpoint)
            .await
            .map_err(|e| LinkError::Connect(e.to_string()))?;
        let (sink, stream) = stream.split();
        let sink = Arc::new(Mutex::new(sink));

        let router = Arc::new(Router::default());
        router.connected.store(true, Ordering::SeqCst);
        let reader = tokio::spawn(read_loop(stream, Arc::clone(&sink), Arc::clone(&router)));

        let link = Self {
            rpc: Arc::new(Rpc {
                endpoint: endpoint.to_string(),
                sink,
                router,
                next_id: AtomicU64::new(1),
                request_timeout,
            }),
            reader,
        };
        let chain = link.rpc.call("system_chain", json!([])).await?;
        debug!(endpoint = %endpoint, chain = %chain, "link ready");
        Ok(link)
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl LedgerLink for WsLink {
    fn endpoint(&self) -> &str {
        &self.rpc.endpoint
    }

    fn is_connected(&self) -> bool {
        self.rpc.is_connected()
    }

    async fn submit(&self, operation: Vec<u8>) -> Result<OperationWatch, LinkError> {
        let transaction_reference = operation_reference(&operation);
        let extrinsic = format!("0x{}", hex::encode(&operation));
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let subscription = self
            .rpc
            .call_with_subscription("author_submitAndWatchExtrinsic", json!([extrinsic]), Some(raw_tx))
            .await?;
        let subscription = subscription_key(&subscription);

        let (tx, updates) = mpsc::channel(STATUS_BUFFER);
        let rpc = Arc::clone(&self.rpc);
        let reference = transaction_reference.clone();
        tokio::spawn(async move {
            let finished = forward_statuses(raw_rx, tx, &reference, |block_hash| {
                let rpc = Arc::clone(&rpc);
                let extrinsic = extrinsic.clone();
                async move { rpc.dispatch_failure(&block_hash, &extrinsic).await }
            })
            .await;
            if let Some(subscription) = subscription {
                rpc.release(&subscription, !finished).await;
            }
        });

        Ok(OperationWatch {
            transaction_reference,
            updates,
        })
    }

    async fn block_number(&self, block_hash: &str) -> Result<u64, LinkError> {
        let header = self.rpc.header(block_hash).await?;
        parse_number(&header["number"])
    }

    async fn chain_head(&self) -> Result<ChainHead, LinkError> {
        let hash = self.rpc.best_hash().await?;
        let header = self.rpc.header(&hash).await?;
        Ok(ChainHead {
            number: parse_number(&header["number"])?,
            hash,
        })
    }

    async fn recent_activity(&self, depth: u32) -> Result<Vec<ActivityItem>, LinkError> {
        let mut hash = self.rpc.best_hash().await?;
        let mut blocks = Vec::new();

        for _ in 0..depth {
            let signed = self.rpc.call("chain_getBlock", json!([hash])).await?;
            let block = &signed["block"];
            let number = parse_number(&block["header"]["number"])?;
            let extrinsics = block["extrinsics"]
                .as_array()
                .ok_or_else(|| LinkError::InvalidResponse(format!("block {hash} has no extrinsics")))?;

            let mut items = Vec::new();
            for encoded in extrinsics.iter().filter_map(Value::as_str) {
                let Ok(bytes) = hex::decode(encoded.trim_start_matches("0x")) else {
                    continue;
                };
                let transaction_reference = operation_reference(&bytes);
                for payload in trailing_byte_args(&bytes) {
                    items.push(ActivityItem {
                        block_number: number,
                        block_hash: hash.clone(),
                        transaction_reference: transaction_reference.clone(),
                        payload: payload.to_vec(),
                    });
                }
            }
            blocks.push(items);

            if number == 0 {
                break;
            }
            hash = block["header"]["parentHash"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| LinkError::InvalidResponse(format!("block {number} has no parent")))?;
        }

        debug!(endpoint = %self.rpc.endpoint, blocks = blocks.len(), "scanned recent blocks");
        blocks.reverse();
        Ok(blocks.into_iter().flatten().collect())
    }

    async fn close(&self) -> Result<(), LinkError> {
        self.rpc.router.connected.store(false, Ordering::SeqCst);
        let closed = self.rpc.sink.lock().await.close().await;
        self.reader.abort();
        fail_outstanding(&self.rpc.router).await;
        closed.map_err(|e| LinkError::Io(e.to_string()))
    }
}

/// Relay parsed statuses from a raw subscription until a terminal status,
/// replacing an inclusion with `DispatchFailed` when `dispatch_failure`
/// finds the call failed in that block.
///
/// Returns whether a terminal status was delivered; `false` means the
/// watcher went away or the subscription ended early.
async fn forward_statuses<F, Fut>(
    mut notifications: mpsc::UnboundedReceiver<Value>,
    tx: mpsc::Sender<OperationStatus>,
    reference: &str,
    dispatch_failure: F,
) -> bool
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Option<OperationStatus>, LinkError>>,
{
    while let Some(raw) = notifications.recv().await {
        let Some(mut status) = parse_status(&raw) else {
            debug!(tx = %reference, raw = %raw, "unrecognised extrinsic status");
            continue;
        };
        if let Some(block_hash) = status.included_in().map(str::to_string) {
            match dispatch_failure(block_hash.clone()).await {
                Ok(Some(failure)) => status = failure,
                Ok(None) => {}
                Err(e) => {
                    warn!(tx = %reference, block = %block_hash, error = %e, "dispatch outcome unknown")
                }
            }
        }
        let terminal = status.is_terminal();
        if tx.send(status).await.is_err() {
            return false;
        }
        if terminal {
            return true;
        }
    }
    false
}

async fn read_loop(mut stream: SplitStream<WsStream>, sink: Arc<Mutex<WsSink>>, router: Arc<Router>) {
    while let Some(msg_result) = stream.next().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("websocket receive error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => route(&text, &router).await,
            Message::Close(_) => {
                debug!("node sent close frame");
                break;
            }
            Message::Ping(data) => {
                let _ = sink.lock().await.send(Message::Pong(data)).await;
            }
            _ => {}
        }
    }

    router.connected.store(false, Ordering::SeqCst);
    fail_outstanding(&router).await;
}

async fn fail_outstanding(router: &Router) {
    for (_, call) in router.calls.lock().await.drain() {
        let _ = call.reply.send(Err(LinkError::Closed));
    }
    router.subscriptions.lock().await.clear();
}

async fn route(text: &str, router: &Router) {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("unparseable rpc frame: {}", e);
            return;
        }
    };

    if let Some(id) = value.get("id").and_then(Value::as_u64) {
        let Some(call) = router.calls.lock().await.remove(&id) else {
            return;
        };
        let result = match value.get("error") {
            Some(error) => Err(rpc_error(error)),
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        };
        if let (Ok(sub_id), Some(channel)) = (&result, call.subscription) {
            if let Some(key) = subscription_key(sub_id) {
                router.subscriptions.lock().await.insert(key, channel);
            }
        }
        let _ = call.reply.send(result);
        return;
    }

    let Some(params) = value.get("params") else {
        return;
    };
    let Some(key) = params.get("subscription").and_then(subscription_key) else {
        return;
    };
    let result = params.get("result").cloned().unwrap_or(Value::Null);
    let mut subscriptions = router.subscriptions.lock().await;
    if let Some(channel) = subscriptions.get(&key) {
        if channel.send(result).is_err() {
            subscriptions.remove(&key);
        }
    }
}

fn rpc_error(error: &Value) -> LinkError {
    let code = error["code"].as_i64().unwrap_or_default();
    let mut message = error["message"].as_str().unwrap_or("unknown error").to_string();
    match &error["data"] {
        Value::String(data) => {
            message.push_str(": ");
            message.push_str(data);
        }
        Value::Null => {}
        other => {
            message.push_str(": ");
            message.push_str(&other.to_string());
        }
    }
    LinkError::Rpc { code, message }
}

fn subscription_key(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_number(value: &Value) -> Result<u64, LinkError> {
    match value {
        Value::String(s) => u64::from_str_radix(s.trim_start_matches("0x"), 16)
            .map_err(|e| LinkError::InvalidResponse(format!("block number {s}: {e}"))),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| LinkError::InvalidResponse(format!("block number {n}"))),
        other => Err(LinkError::InvalidResponse(format!("block number {other}"))),
    }
}

/// Map an `author_extrinsicUpdate` payload to a status.
fn parse_status(raw: &Value) -> Option<OperationStatus> {
    if let Some(s) = raw.as_str() {
        return match s {
            "future" => Some(OperationStatus::Future),
            "ready" => Some(OperationStatus::Ready),
            "dropped" => Some(OperationStatus::Dropped {
                reason: "dropped from the pool".into(),
            }),
            "invalid" => Some(OperationStatus::Invalid {
                reason: "rejected by the pool".into(),
            }),
            _ => None,
        };
    }

    let (kind, value) = raw.as_object()?.iter().next()?;
    let hash = || value.as_str().unwrap_or_default().to_string();
    match kind.as_str() {
        "broadcast" => Some(OperationStatus::Broadcast),
        "inBlock" => Some(OperationStatus::InBlock { block_hash: hash() }),
        "retracted" => Some(OperationStatus::Retracted { block_hash: hash() }),
        "finalityTimeout" => Some(OperationStatus::FinalityTimeout { block_hash: hash() }),
        "finalized" => Some(OperationStatus::Finalized { block_hash: hash() }),
        "usurped" => Some(OperationStatus::Usurped { by: hash() }),
        "dropped" => Some(OperationStatus::Dropped { reason: hash() }),
        "invalid" => Some(OperationStatus::Invalid { reason: value.to_string() }),
        _ => None,
    }
}
