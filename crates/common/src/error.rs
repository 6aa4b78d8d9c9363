//! Error types shared across Frameloom crates.

/// Top-level error type for Frameloom operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameloomError {
    /// Validation failures, collected rather than reported one at a time.
    #[error("Configuration error: {}", .messages.join("; "))]
    Config { messages: Vec<String> },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Invalid state: {message}")]
    State { message: String },

    /// Internal cache invariant violation. Not expected in normal operation;
    /// cache misses and evictions are values, not errors.
    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FrameloomError.
pub type FrameloomResult<T> = Result<T, FrameloomError>;

impl FrameloomError {
    pub fn config(messages: Vec<String>) -> Self {
        Self::Config { messages }
    }

    pub fn config_one(msg: impl Into<String>) -> Self {
        Self::Config {
            messages: vec![msg.into()],
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State {
            message: msg.into(),
        }
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    /// The validation messages carried by a `Config` error, empty otherwise.
    pub fn validation_messages(&self) -> &[String] {
        match self {
            Self::Config { messages } => messages,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_joins_messages() {
        let err = FrameloomError::config(vec![
            "width must be greater than zero".to_string(),
            "fps must be greater than zero".to_string(),
        ]);
        let text = err.to_string();
        assert!(text.contains("width must be greater than zero"));
        assert!(text.contains("; fps must be greater than zero"));
        assert_eq!(err.validation_messages().len(), 2);
    }

    #[test]
    fn test_helper_constructors() {
        let err = FrameloomError::state("recorder already started");
        assert_eq!(err.to_string(), "Invalid state: recorder already started");
        assert!(err.validation_messages().is_empty());
    }
}
