use crate::registry::ConnectionRegistry;
use crate::relay::PeerSession;
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use switchboard_core::{ClientEvent, ConnectionId, PeerInfo, RoomId, ServerEvent, UserId};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Routes room events and signaling payloads between connections.
///
/// The relay never looks inside offers, answers or candidates: it only
/// swaps `to` for `from` and hands the payload to the addressed connection.
///
/// Joins and leaves run under one membership lock together with their
/// announcements, so every peer sees membership changes in registry order.
#[derive(Clone)]
pub struct SignalingRelay {
    registry: Arc<ConnectionRegistry>,
    output: Arc<dyn SignalingOutput>,
    membership: Arc<Mutex<()>>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<ConnectionRegistry>, output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            registry,
            output,
            membership: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Starts a session for a freshly accepted connection and tells the
    /// peer its own connection id.
    pub async fn open(&self, connection_id: ConnectionId) -> PeerSession {
        info!("Connection {} opened", connection_id);
        self.output
            .send_event(&connection_id, ServerEvent::Connected { connection_id })
            .await;
        PeerSession::new(connection_id)
    }

    /// Decodes one text frame and applies it. Malformed frames are dropped.
    pub async fn handle_text(&self, session: &mut PeerSession, text: &str) {
        match ClientEvent::parse(text) {
            Ok(event) => self.handle_event(session, event).await,
            Err(e) => debug!(
                "Dropping malformed event from {}: {}",
                session.connection_id(),
                e
            ),
        }
    }

    pub async fn handle_event(&self, session: &mut PeerSession, event: ClientEvent) {
        if session.is_closed() {
            debug!("Ignoring event on closed connection {}", session.connection_id());
            return;
        }

        let from = session.connection_id();

        match event {
            ClientEvent::JoinRoom { room_id, user_id } => {
                let _membership = self.membership.lock().await;
                self.join_room(session, room_id, user_id).await;
            }

            ClientEvent::SignalOffer { to, description } => {
                self.forward(&to, ServerEvent::SignalOffer { from, description })
                    .await;
            }

            ClientEvent::SignalAnswer { to, description } => {
                self.forward(&to, ServerEvent::SignalAnswer { from, description })
                    .await;
            }

            ClientEvent::SignalIceCandidate { to, candidate } => {
                self.forward(&to, ServerEvent::SignalIceCandidate { from, candidate })
                    .await;
            }

            ClientEvent::LeaveRoom => {
                if session.room().is_none() {
                    debug!("leave-room from {} outside any room", from);
                    return;
                }
                let _membership = self.membership.lock().await;
                self.leave_room(from).await;
                session.left();
            }
        }
    }

    /// Transport-level disconnect. Runs the leave effect; the session is
    /// terminal afterwards.
    pub async fn close(&self, session: &mut PeerSession) {
        if session.is_closed() {
            return;
        }

        // Cleanup keys off the registry, not the session, so a join that was
        // interrupted before the session recorded it is still undone.
        {
            let _membership = self.membership.lock().await;
            self.leave_room(session.connection_id()).await;
        }
        session.closed();

        info!("Connection {} closed", session.connection_id());
    }

    /// Caller holds the membership lock.
    async fn join_room(&self, session: &mut PeerSession, room_id: RoomId, user_id: UserId) {
        let connection_id = session.connection_id();

        let moving = session.room().is_some_and(|current| *current != room_id);
        if moving {
            self.leave_room(connection_id).await;
            session.left();
        }

        let peers = self.registry.join(room_id.clone(), connection_id, user_id.clone());
        session.joined(room_id.clone());

        info!(
            "{} joined room '{}' as '{}' ({} peers present)",
            connection_id,
            room_id,
            user_id,
            peers.len()
        );

        for peer in peers.keys() {
            self.output
                .send_event(
                    peer,
                    ServerEvent::UserJoined {
                        connection_id,
                        user_id: user_id.clone(),
                    },
                )
                .await;
        }

        let mut listing: Vec<PeerInfo> = peers
            .into_iter()
            .map(|(connection_id, user_id)| PeerInfo {
                connection_id,
                user_id,
            })
            .collect();
        listing.sort_by_key(|p| p.connection_id);

        self.output
            .send_event(&connection_id, ServerEvent::RoomPeers(listing))
            .await;
    }

    /// Caller holds the membership lock.
    async fn leave_room(&self, connection_id: ConnectionId) {
        let Some(departure) = self.registry.leave(&connection_id) else {
            return;
        };

        info!(
            "{} ('{}') left room '{}'",
            connection_id, departure.user_id, departure.room_id
        );

        for peer in &departure.remaining_peers {
            self.output
                .send_event(
                    peer,
                    ServerEvent::UserLeft {
                        connection_id,
                        user_id: departure.user_id.clone(),
                    },
                )
                .await;
        }
    }

    async fn forward(&self, to: &ConnectionId, event: ServerEvent) {
        debug!("Forwarding {} to {}", event.name(), to);
        self.output.send_event(to, event).await;
    }
}
