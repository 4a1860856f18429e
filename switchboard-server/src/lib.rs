mod app;
mod config;
mod registry;
mod relay;
mod signaling;

pub use app::*;
pub use config::*;
pub use registry::*;
pub use relay::*;
pub use signaling::*;
