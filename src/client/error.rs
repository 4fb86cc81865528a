use serde::Deserialize;
use thiserror::Error;

use crate::schema::ValidationError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected input, either locally or by the server's 400.
    #[error("{message}")]
    Validation { field: String, message: String },
    #[error("Not signed in or session expired")]
    Unauthorized,
    #[error("Not allowed to modify this record")]
    Forbidden,
    #[error("Record not found")]
    NotFound,
    #[error("Server returned status {0}")]
    Status(u16),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl ClientError {
    /// Validation messages are shown as-is; anything else gets `fallback`.
    pub fn notification(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation { message, .. } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Body of a 400 response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_messages_reach_the_user() {
        let err = ClientError::from(ValidationError::new("content", "Content cannot be empty"));
        assert_eq!(err.notification("Failed to save task"), "Content cannot be empty");
        assert_eq!(
            ClientError::Status(502).notification("Failed to save task"),
            "Failed to save task"
        );
    }
}
