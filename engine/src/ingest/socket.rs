use adapters::socket::{Connector, SocketClient, SocketExit};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::IngestEvent;

/// Runs the socket client in its own task, tagging every frame for ingestion.
pub fn spawn_socket_producer<C>(
    client: SocketClient<C>,
    tx: mpsc::Sender<IngestEvent>,
) -> JoinHandle<SocketExit>
where
    C: Connector + 'static,
{
    tokio::spawn(async move {
        let exit = client.run(tx, IngestEvent::SocketFrame).await;
        info!(exit = ?exit, "socket producer stopped");
        exit
    })
}
