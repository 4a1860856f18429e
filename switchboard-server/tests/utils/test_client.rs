use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use switchboard_core::{ClientEvent, ConnectionId};
use switchboard_server::{AllowedOrigins, AppState, router};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single expected frame (ms).
pub const FRAME_TIMEOUT_MS: u64 = 2000;

/// Serves the full router on an ephemeral local port.
pub async fn spawn_server(allowed_origins: AllowedOrigins) -> Result<(SocketAddr, AppState)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind test listener")?;
    let addr = listener.local_addr()?;
    let state = AppState::new(allowed_origins);
    let app = router(state.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((addr, state))
}

/// A peer speaking the relay protocol over a real WebSocket.
pub struct TestClient {
    pub connection_id: ConnectionId,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_origin(addr, None).await
    }

    pub async fn connect_with_origin(addr: SocketAddr, origin: Option<&'static str>) -> Result<Self> {
        let mut request = format!("ws://{}/ws", addr).into_client_request()?;
        if let Some(origin) = origin {
            request
                .headers_mut()
                .insert("Origin", HeaderValue::from_static(origin));
        }

        let (stream, _) = connect_async(request).await?;
        let mut client = Self {
            connection_id: ConnectionId::new(),
            stream,
        };

        let hello = client.next_event().await?;
        if hello["event"] != "connected" {
            bail!("Expected connected frame, got {}", hello);
        }
        client.connection_id = hello["data"]["connectionId"]
            .as_str()
            .context("connected frame without connectionId")?
            .parse()?;

        Ok(client)
    }

    pub async fn send(&mut self, event: &ClientEvent) -> Result<()> {
        self.send_text(event.to_json()?).await
    }

    pub async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    /// Raw text of the next text frame.
    pub async fn next_text(&mut self) -> Result<String> {
        let timeout = Duration::from_millis(FRAME_TIMEOUT_MS);

        loop {
            let frame = tokio::time::timeout(timeout, self.stream.next())
                .await
                .context("Timeout waiting for frame")?;

            match frame {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_string()),
                Some(Ok(Message::Close(_))) | None => bail!("Socket closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    pub async fn next_event(&mut self) -> Result<Value> {
        let text = self.next_text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// True when nothing arrives within `wait_ms`.
    pub async fn is_quiet(&mut self, wait_ms: u64) -> bool {
        tokio::time::timeout(Duration::from_millis(wait_ms), self.stream.next())
            .await
            .is_err()
    }

    /// True when the server ends the socket within `wait_ms`.
    pub async fn wait_closed(&mut self, wait_ms: u64) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(wait_ms);

        loop {
            match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Err(_) => return false,
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

pub async fn get_health(addr: SocketAddr) -> Result<Value> {
    let health = reqwest::get(format!("http://{}/health", addr))
        .await?
        .error_for_status()?
        .json::<Value>()
        .await?;
    Ok(health)
}

pub async fn get_with_origin(addr: SocketAddr, path: &str, origin: &str) -> Result<reqwest::Response> {
    let response = reqwest::Client::new()
        .get(format!("http://{}{}", addr, path))
        .header("Origin", origin)
        .send()
        .await?;
    Ok(response)
}
