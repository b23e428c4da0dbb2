use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use super::{Connector, FrameStream};

/// WebSocket connector backed by tokio-tungstenite.
///
/// Ping/pong and binary frames are dropped; only text reaches the caller.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str, hello: Option<&str>) -> anyhow::Result<FrameStream> {
        let (mut ws, _) = connect_async(url).await?;

        if let Some(hello) = hello {
            debug!("sending authenticate frame");
            ws.send(Message::Text(hello.to_string().into())).await?;
        }

        let frames = ws.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(_)) => None,
                Ok(other) => {
                    debug!(msg_type = ?other, "ignoring non-text websocket message");
                    None
                }
                Err(e) => Some(Err(anyhow::Error::from(e))),
            })
        });

        Ok(frames.boxed())
    }
}
