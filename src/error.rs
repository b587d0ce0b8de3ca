pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing, expired or rejected credential. Always fatal to the current view.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Client-side form validation; never sent to the server.
    #[error("{0}")]
    Validation(String),

    /// The server refused the request for a business reason. `message` is shown verbatim.
    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn rejected(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        ClientError::Rejected {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// Machine-readable error code reported by the server, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Text suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Rejected { message, .. } | ClientError::Validation(message) => {
                message.clone()
            }
            ClientError::Unauthorized(_) => "Session expired. Please login again.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}
