use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid server response";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend rejected request ({}): {}", status_label(.status), .message.as_deref().unwrap_or("no details"))]
    Rejected {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("Malformed response (status {status})")]
    Malformed { status: u16, raw: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn status_label(status: &Option<u16>) -> String {
    status.map(|s| s.to_string()).unwrap_or_else(|| "ok".to_string())
}

impl AppError {
    pub fn rejected(message: Option<String>) -> Self {
        AppError::Rejected { status: None, message }
    }

    /// Text suitable for showing to the user. Backend messages are passed
    /// through verbatim; everything else maps to a fixed message or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            AppError::Rejected { message: Some(msg), .. } if !msg.trim().is_empty() => msg.clone(),
            AppError::Validation(msg) | AppError::Unauthorized(msg) => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }

    /// Raw body kept for diagnostics when the backend sent something unparseable.
    pub fn diagnostic_payload(&self) -> Option<&str> {
        match self {
            AppError::Malformed { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
