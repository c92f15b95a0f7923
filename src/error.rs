use thiserror::Error;

/// Failure of a `/api/chat` call. The display text is what the user sees
/// after the `Error:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("{detail}")]
    Status { status: u16, detail: String },
    #[error("{0}")]
    Transport(String),
    #[error("invalid response from server: {0}")]
    Decode(String),
}

impl ChatError {
    pub fn status(status: u16, body: &str) -> Self {
        let detail = if body.is_empty() {
            "Request failed".to_string()
        } else {
            body.to_string()
        };
        ChatError::Status { status, detail }
    }

    pub fn transport(err: &reqwest::Error) -> Self {
        let detail = err.to_string();
        if detail.is_empty() {
            ChatError::Transport("Failed to connect to server".to_string())
        } else {
            ChatError::Transport(detail)
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ChatError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text rendered into the chat log.
    pub fn user_message(&self) -> String {
        format!("Error: {}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("speech recognition is not available")]
    Unsupported,
    #[error("speech recognition failed: {0}")]
    Failed(String),
}
