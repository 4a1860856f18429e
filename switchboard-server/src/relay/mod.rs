mod peer_session;
mod signaling_relay;

pub use peer_session::*;
pub use signaling_relay::*;
