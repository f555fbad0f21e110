use reqwest::StatusCode;
use thiserror::Error;

/// Failures that make a whole authoritative fetch unusable
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to geometry service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("geometry service returned status {status}")]
    Status { status: StatusCode },

    #[error("could not parse geometry service response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("geometry service query failed: {0}")]
    Remark(String),
}

impl FetchError {
    /// Whether the request ran out of time
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Transport(e) => e.is_timeout(),
            FetchError::Remark(remark) => remark.contains("timed out"),
            _ => false,
        }
    }
}
