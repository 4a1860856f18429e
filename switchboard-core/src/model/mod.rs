mod connection;
mod event;
mod member;
mod room;
mod user;

pub use connection::ConnectionId;
pub use event::{ClientEvent, ServerEvent};
pub use member::{Departure, Member, PeerInfo};
pub use room::RoomId;
pub use user::UserId;
