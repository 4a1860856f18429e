use crate::error::ProtocolError;
use crate::model::connection::ConnectionId;
use crate::model::member::PeerInfo;
use crate::model::room::RoomId;
use crate::model::user::UserId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Events a peer sends to the relay.
///
/// Every frame is an envelope `{"event": <name>, "data": <payload>}`.
/// Session descriptions and candidates stay as raw JSON text so they are
/// forwarded exactly as received.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: RoomId, user_id: UserId },
    SignalOffer {
        to: ConnectionId,
        description: Box<RawValue>,
    },
    SignalAnswer {
        to: ConnectionId,
        description: Box<RawValue>,
    },
    SignalIceCandidate {
        to: ConnectionId,
        candidate: Box<RawValue>,
    },
    LeaveRoom,
}

/// Events the relay sends to a peer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// First frame on every socket: tells the peer its own address.
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: ConnectionId },
    #[serde(rename_all = "camelCase")]
    UserJoined {
        connection_id: ConnectionId,
        user_id: UserId,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft {
        connection_id: ConnectionId,
        user_id: UserId,
    },
    RoomPeers(Vec<PeerInfo>),
    SignalOffer {
        from: ConnectionId,
        description: Box<RawValue>,
    },
    SignalAnswer {
        from: ConnectionId,
        description: Box<RawValue>,
    },
    SignalIceCandidate {
        from: ConnectionId,
        candidate: Box<RawValue>,
    },
}

#[derive(Deserialize)]
struct Envelope<'a> {
    event: String,
    #[serde(borrow, default)]
    data: Option<&'a RawValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRoomData {
    room_id: RoomId,
    user_id: UserId,
}

#[derive(Deserialize)]
struct DescriptionData {
    to: ConnectionId,
    description: Box<RawValue>,
}

#[derive(Deserialize)]
struct CandidateData {
    to: ConnectionId,
    candidate: Box<RawValue>,
}

fn payload<T: DeserializeOwned>(
    event: &'static str,
    data: Option<&RawValue>,
) -> Result<T, ProtocolError> {
    let raw = data.ok_or(ProtocolError::MissingData(event))?;
    Ok(serde_json::from_str(raw.get())?)
}

impl ClientEvent {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope<'_> = serde_json::from_str(text)?;

        let event = match envelope.event.as_str() {
            "join-room" => {
                let data: JoinRoomData = payload("join-room", envelope.data)?;
                ClientEvent::JoinRoom {
                    room_id: data.room_id,
                    user_id: data.user_id,
                }
            }
            "signal-offer" => {
                let data: DescriptionData = payload("signal-offer", envelope.data)?;
                ClientEvent::SignalOffer {
                    to: data.to,
                    description: data.description,
                }
            }
            "signal-answer" => {
                let data: DescriptionData = payload("signal-answer", envelope.data)?;
                ClientEvent::SignalAnswer {
                    to: data.to,
                    description: data.description,
                }
            }
            "signal-ice-candidate" => {
                let data: CandidateData = payload("signal-ice-candidate", envelope.data)?;
                ClientEvent::SignalIceCandidate {
                    to: data.to,
                    candidate: data.candidate,
                }
            }
            "leave-room" => ClientEvent::LeaveRoom,
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };

        Ok(event)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::UserJoined { .. } => "user-joined",
            ServerEvent::UserLeft { .. } => "user-left",
            ServerEvent::RoomPeers(_) => "room-peers",
            ServerEvent::SignalOffer { .. } => "signal-offer",
            ServerEvent::SignalAnswer { .. } => "signal-answer",
            ServerEvent::SignalIceCandidate { .. } => "signal-ice-candidate",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
