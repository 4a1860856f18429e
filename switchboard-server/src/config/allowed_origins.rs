use axum::http::HeaderValue;
use std::str::FromStr;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("allowed origin list contains an empty entry")]
    EmptyOrigin,

    #[error("`{0}` is not a valid origin header value")]
    InvalidOrigin(String),
}

/// Which `Origin` headers may open a socket or read a CORS response.
///
/// Listed origins are stored lowercase without a trailing `/`; incoming
/// headers are compared the same way on every path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

impl AllowedOrigins {
    pub fn allows(&self, origin: &HeaderValue) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(origins) => {
                let incoming = origin.as_bytes();
                let incoming = incoming.strip_suffix(b"/").unwrap_or(incoming);
                origins
                    .iter()
                    .any(|o| o.as_bytes().eq_ignore_ascii_case(incoming))
            }
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let origin = match self {
            AllowedOrigins::Any => AllowOrigin::from(Any),
            AllowedOrigins::List(_) => {
                let policy = self.clone();
                AllowOrigin::predicate(move |origin, _| policy.allows(origin))
            }
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// `*` for any origin, otherwise a comma separated list such as
/// `https://app.example.com,http://localhost:5173`.
impl FromStr for AllowedOrigins {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut origins = Vec::new();

        for entry in s.split(',').map(str::trim) {
            if entry.is_empty() {
                return Err(ConfigError::EmptyOrigin);
            }
            if entry == "*" {
                return Ok(AllowedOrigins::Any);
            }
            let value = HeaderValue::from_str(&entry.trim_end_matches('/').to_ascii_lowercase())
                .map_err(|_| ConfigError::InvalidOrigin(entry.to_string()))?;
            origins.push(value);
        }

        Ok(AllowedOrigins::List(origins))
    }
}
