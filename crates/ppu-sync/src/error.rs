use std::path::PathBuf;

use ppu_core::AssembleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read attachment {}: {}", .path.display(), .source)]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("a submit is already in progress")]
    SubmitInFlight,

    #[error("request cancelled")]
    Cancelled,
}

impl SyncError {
    /// Text for the alert shown to the user: the backend's own message when
    /// it sent one, otherwise the error itself.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Pull the `error` field out of a failed response body.
///
/// Falls back to the raw body, then to the bare status.
pub fn server_message(status: u16, body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    if let Ok(ErrorBody { error: Some(msg) }) = serde_json::from_str::<ErrorBody>(body)
        && !msg.trim().is_empty()
    {
        return msg;
    }
    let body = body.trim();
    if body.is_empty() || body.starts_with('<') {
        format!("HTTP {status}")
    } else {
        body.to_string()
    }
}
