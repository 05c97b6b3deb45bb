use shared::error::{ApiErrorBody, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success response. `body` is pretty-printed when it was JSON and
    /// verbatim otherwise.
    #[error("{status} {reason}\n{body}")]
    Collaborator {
        status: u16,
        reason: String,
        code: ErrorCode,
        body: String,
    },
    /// Success status with a body that is not the expected structure; the
    /// raw text is surfaced as the message.
    #[error("{body}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Validation(String),
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Collaborator { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Collaborator { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The human-readable message from a JSON error body, if there is one.
    pub fn detail(&self) -> Option<String> {
        match self {
            ClientError::Collaborator { body, .. } => serde_json::from_str::<ApiErrorBody>(body)
                .ok()
                .and_then(|parsed| parsed.message()),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
