use crate::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use switchboard_core::ConnectionId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    if let Some(origin) = headers.get(header::ORIGIN)
        && !state.allowed_origins.allows(origin)
    {
        warn!("Rejecting WebSocket upgrade from origin {:?}", origin);
        return StatusCode::FORBIDDEN.into_response();
    }

    let connection_id = ConnectionId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, state))
}

async fn handle_socket(socket: WebSocket, connection_id: ConnectionId, state: AppState) {
    info!("New WebSocket connection: {}", connection_id);

    let mut shutdown = state.shutdown_signal();

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.hub.add_connection(connection_id, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let relay = &state.relay;
    let mut session = relay.open(connection_id).await;

    let recv_loop = async {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => relay.handle_text(&mut session, text.as_str()).await,
                Message::Binary(_) => {
                    debug!("Dropping binary frame from {}", connection_id);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    let stopping = async {
        let _ = shutdown.wait_for(|stopping| *stopping).await;
    };

    tokio::select! {
        _ = recv_loop => {},
        _ = stopping => {
            debug!("Closing {} for shutdown", connection_id);
        },
        _ = (&mut send_task) => {
            debug!("Writer for {} stopped first", connection_id);
        },
    };

    // Membership must be gone before the socket's writer is.
    relay.close(&mut session).await;
    state.hub.remove_connection(&connection_id);
    send_task.abort();

    info!("WebSocket disconnected: {}", connection_id);
}
