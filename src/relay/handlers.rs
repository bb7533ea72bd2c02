use axum::{
    Json, Router,
    extract::{
        Extension,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::mpsc;

use super::service::{Delivery, RelayHandle};
use super::types::{ConnectionId, Outgoing, RelayStatus};
use crate::protocol::Event;

pub const WS_ENDPOINT: &str = "/ws";
pub const STATUS_ENDPOINT: &str = "/status";

pub fn router(relay: RelayHandle) -> Router {
    Router::new()
        .route(WS_ENDPOINT, get(handle_upgrade))
        .route(STATUS_ENDPOINT, get(handle_status))
        .layer(Extension(relay))
}

pub async fn handle_upgrade(
    Extension(relay): Extension<RelayHandle>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_connection(relay, socket))
}

pub async fn handle_status(
    Extension(relay): Extension<RelayHandle>,
) -> Result<Json<RelayStatus>, StatusCode> {
    match relay.status().await {
        Ok(status) => Ok(Json(status)),
        Err(e) => {
            tracing::error!("Failed to read relay status: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Pumps one socket: inbound frames go to the relay, deliveries come back through a courier task.
pub async fn serve_connection(relay: RelayHandle, socket: WebSocket) {
    let id = ConnectionId::new();
    let (sink, mut stream) = socket.split();
    let (courier, deliveries) = mpsc::unbounded_channel();

    relay.connect(id.clone(), courier);
    let mut courier_task = tokio::spawn(run_courier(id.clone(), sink, deliveries));

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match Event::decode(&text) {
                    Ok(event) => relay.inbound(id.clone(), event),
                    Err(e) => tracing::warn!("Dropping frame from {}: {}", id, e),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Socket error on {}: {}", id, e);
                    break;
                }
            },
            _ = &mut courier_task => break,
        }
    }

    courier_task.abort();
    relay.disconnected(id);
}

/// Writes deliveries in arrival order, each no earlier than its stamp.
async fn run_courier(
    id: ConnectionId,
    mut sink: SplitSink<WebSocket, Message>,
    mut deliveries: mpsc::UnboundedReceiver<Delivery>,
) {
    while let Some(delivery) = deliveries.recv().await {
        tokio::time::sleep_until(delivery.deliver_at).await;

        match delivery.outgoing {
            Outgoing::Event(event) => {
                tracing::debug!("Delivering '{}' to {}", event.name(), id);
                if let Err(e) = sink.send(Message::Text(event.encode())).await {
                    tracing::warn!("Failed to deliver to {}: {}", id, e);
                    break;
                }
            }
            Outgoing::Sever => {
                tracing::info!("Severing connection {}", id);
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }
}
