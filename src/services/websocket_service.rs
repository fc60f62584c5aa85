use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    services::round_service,
    state::{PlayerConnection, SharedState},
};

/// Handle the full lifecycle for an individual player WebSocket connection.
///
/// `peer` identifies the remote end and is recorded as the owner of any claim this
/// player wins.
pub async fn handle_socket(state: SharedState, socket: WebSocket, peer: String) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sender.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    let connection = PlayerConnection::new(peer, outbound_tx.clone());
    state.connections().register(connection.clone());
    info!(connection = %connection.id, peer = %connection.peer, "player connected");

    if !round_service::greeting(&state, &connection).await {
        info!(connection = %connection.id, "connection closed during greeting, terminating");
        drop(connection);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(connection = %connection.id, payload = %text, "received answer");
                let verdict =
                    round_service::handle_submission(&state, &connection, text.as_str()).await;
                debug!(connection = %connection.id, verdict = ?verdict, "answer arbitrated");
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(connection = %connection.id, "player closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection = %connection.id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.connections().unregister(&connection.id);
    info!(connection = %connection.id, "player disconnected");

    // The handle holds a sender too; the writer only stops once every sender is gone.
    drop(connection);
    finalize(writer_task, outbound_tx).await;
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
