use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    Forbidden,
    NotFound,
    Validation,
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorCode::BadRequest,
            401 | 403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            422 => ErrorCode::Validation,
            500..=599 => ErrorCode::Internal,
            _ => ErrorCode::Unknown,
        }
    }
}

/// Error body returned by the intake backend. The backend itself sends
/// `{"detail": ...}`, where the detail is either a message or a list of field
/// errors; proxies in front of it send `message` or `error` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// First non-empty of `detail`, `message` and `error`.
    pub fn message(&self) -> Option<String> {
        self.detail
            .as_ref()
            .and_then(detail_text)
            .or_else(|| self.message.clone())
            .or_else(|| self.error.clone())
            .filter(|text| !text.trim().is_empty())
    }
}

fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        Value::Array(entries) => Some(
            entries
                .iter()
                .map(|entry| {
                    entry
                        .get("msg")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| entry.to_string())
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
        other => Some(other.to_string()),
    }
}
