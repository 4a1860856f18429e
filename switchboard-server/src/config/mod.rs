mod allowed_origins;
mod relay_config;

pub use allowed_origins::*;
pub use relay_config::*;
