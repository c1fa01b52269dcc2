use reqwest::StatusCode;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{0}")]
    Validation(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Not authorized: {0}")]
    Authorization(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Report generation failed: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by controllers and views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Authorization,
    NotFound,
}

impl PortalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PortalError::Validation(_) => ErrorKind::Validation,
            PortalError::Authorization(_) => ErrorKind::Authorization,
            PortalError::NotFound(_) => ErrorKind::NotFound,
            PortalError::Network(_)
            | PortalError::Http(_)
            | PortalError::Report(_)
            | PortalError::Io(_)
            | PortalError::Json(_) => ErrorKind::Network,
        }
    }

    /// Maps a non-success response status onto the error taxonomy.
    pub fn from_status(status: StatusCode, what: &str, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("{what} failed with status {status}"));
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortalError::Authorization(message),
            StatusCode::NOT_FOUND => PortalError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                PortalError::Validation(message)
            }
            _ => {
                error!(%status, "{what} failed");
                PortalError::Network(message)
            }
        }
    }

    /// Text shown to the user in a notification.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Validation(msg) => msg.clone(),
            PortalError::Authorization(_) => "Session expired, please log in again".into(),
            PortalError::NotFound(msg) => msg.clone(),
            PortalError::Network(msg) => msg.clone(),
            PortalError::Http(_) => "Could not reach the lecture service".into(),
            PortalError::Json(_) | PortalError::Io(_) => {
                "Something went wrong".into()
            }
            PortalError::Report(_) => "Failed to generate the report".into(),
        }
    }
}
