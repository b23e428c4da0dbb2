//! Realtime notification socket.
//!
//! [`SocketClient`] owns the connect/read/reconnect loop and forwards every text
//! frame to an mpsc channel. Parsing happens downstream; this layer only moves
//! strings.

pub mod reconnect;
pub mod ws;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

pub use reconnect::ReconnectPolicy;
pub use ws::TungsteniteConnector;

/// Text frames of one live connection. The stream ends when the socket closes.
pub type FrameStream = BoxStream<'static, anyhow::Result<String>>;

#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection and sends `hello` as the first frame, if given.
    async fn connect(&self, url: &str, hello: Option<&str>) -> anyhow::Result<FrameStream>;
}

/// The `authenticate` frame sent on every (re)connect while wallets are connected.
pub fn authenticate_frame(wallet_addresses: &[String]) -> Option<String> {
    if wallet_addresses.is_empty() {
        return None;
    }
    Some(
        json!({
            "type": "authenticate",
            "payload": { "walletAddresses": wallet_addresses }
        })
        .to_string(),
    )
}

/// Why [`SocketClient::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketExit {
    /// Every reconnect attempt failed; the producer stays stopped.
    Exhausted,
    /// Nobody is listening anymore.
    ReceiverDropped,
}

pub struct SocketClient<C> {
    connector: C,
    url: String,
    hello: Option<String>,
    policy: ReconnectPolicy,
}

impl<C: Connector> SocketClient<C> {
    pub fn new(connector: C, url: impl Into<String>, hello: Option<String>) -> Self {
        Self {
            connector,
            url: url.into(),
            hello,
            policy: ReconnectPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Connects, forwards frames wrapped by `wrap`, and reconnects with backoff
    /// until the policy gives up or the receiver is dropped.
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn run<T, F>(mut self, tx: mpsc::Sender<T>, wrap: F) -> SocketExit
    where
        T: Send,
        F: Fn(String) -> T + Send,
    {
        loop {
            match self.connector.connect(&self.url, self.hello.as_deref()).await {
                Ok(mut frames) => {
                    info!("socket connected");
                    self.policy.reset();

                    while let Some(frame) = frames.next().await {
                        match frame {
                            Ok(text) => {
                                tracing::trace!(raw = %text, "socket frame received");
                                if tx.send(wrap(text)).await.is_err() {
                                    debug!("socket frame receiver dropped; stopping");
                                    return SocketExit::ReceiverDropped;
                                }
                            }
                            Err(e) => {
                                warn!(error = ?e, "socket stream error");
                                break;
                            }
                        }
                    }
                    warn!("socket disconnected");
                }
                Err(e) => error!(error = ?e, "socket connection failed"),
            }

            match self.policy.next_delay() {
                Some(delay) => {
                    info!(
                        attempt = self.policy.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "reconnecting socket"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(
                        attempts = self.policy.attempts(),
                        "socket reconnect attempts exhausted; giving up"
                    );
                    return SocketExit::Exhausted;
                }
            }
        }
    }
}
