use thiserror::Error;

/// Failures surfaced by the remote auth API client.
///
/// `Http` means the server answered and rejected the call; `Network` and
/// `Timeout` mean no response was obtained. Callers rely on that distinction.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Request failed ({status}): {message}")]
    Http {
        status: u16,
        message: String,
        body: serde_json::Value,
    },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Not authenticated")]
    Unauthenticated,
}

impl ApiError {
    /// HTTP status of a server rejection, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when no response was obtained from the server.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}
