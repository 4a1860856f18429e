use crate::{AllowedOrigins, ConnectionRegistry, SignalingHub, SignalingRelay, ws_handler};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

/// Everything the HTTP layer needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub relay: SignalingRelay,
    pub hub: SignalingHub,
    pub allowed_origins: AllowedOrigins,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(allowed_origins: AllowedOrigins) -> Self {
        let hub = SignalingHub::new();
        let registry = Arc::new(ConnectionRegistry::new());
        let relay = SignalingRelay::new(registry, Arc::new(hub.clone()));

        Self {
            relay,
            hub,
            allowed_origins,
            shutdown: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Flips to `true` once shutdown starts. Socket tasks watch it so every
    /// session still runs its disconnect cleanup.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn shutdown(&self) {
        info!("Closing {} open connections", self.hub.connection_count());
        self.shutdown.send_replace(true);
    }

    /// Waits until every socket task has finished its cleanup. `false` when
    /// some were still open after `timeout`.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        while self.hub.connection_count() > 0 {
            if Instant::now() >= deadline {
                warn!(
                    "{} connections still open after {:?}",
                    self.hub.connection_count(),
                    timeout
                );
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        true
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub rooms: usize,
    pub connections: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        rooms: state.relay.registry().room_count(),
        connections: state.hub.connection_count(),
    })
}

pub fn router(state: AppState) -> Router {
    let cors = state.allowed_origins.cors_layer();

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}
