use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("{message}")]
    ValidationError { message: String },

    #[error("body is larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("{context}: {message}")]
    TransportError { context: String, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("file decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("cannot get a QR Code instance: {message}")]
    EncodeError { message: String },

    #[error("QR Code scanning error: {message}")]
    ScanError { message: String },

    #[error("Chat API error: {message}")]
    ChatError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("server did not drain within {seconds}s")]
    ShutdownTimeout { seconds: u64 },
}

/// Coarse classification used to pick a response status or exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad client input. Never retried.
    Validation,
    /// I/O or network failure while reading, downloading or replying.
    Transport,
    /// The encode/decode libraries or the image container decoder failed.
    Collaborator,
    /// Startup configuration problem; the process exits.
    FatalConfig,
}

impl QrError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            QrError::ValidationError { .. } | QrError::TooLarge { .. } => ErrorCategory::Validation,
            QrError::IoError(_)
            | QrError::ApiError(_)
            | QrError::TransportError { .. }
            | QrError::SerializationError(_)
            | QrError::ChatError { .. }
            | QrError::ShutdownTimeout { .. } => ErrorCategory::Transport,
            QrError::ImageError(_) | QrError::EncodeError { .. } | QrError::ScanError { .. } => {
                ErrorCategory::Collaborator
            }
            QrError::ConfigError { .. }
            | QrError::ConfigValidationError { .. }
            | QrError::InvalidConfigValueError { .. } => ErrorCategory::FatalConfig,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        QrError::ValidationError {
            message: message.into(),
        }
    }

    pub fn transport(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        QrError::TransportError {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QrError>;

/// Text of a caught panic payload.
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            QrError::validation("content is empty").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            QrError::TooLarge { limit: 10 }.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            QrError::transport("body read error", "connection reset").category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            QrError::ScanError {
                message: "boom".to_string()
            }
            .category(),
            ErrorCategory::Collaborator
        );
        assert_eq!(
            QrError::InvalidConfigValueError {
                field: "rtm_token".to_string(),
                value: String::new(),
                reason: "Value cannot be empty or whitespace-only".to_string(),
            }
            .category(),
            ErrorCategory::FatalConfig
        );
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*boxed), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }

    #[test]
    fn test_transport_message_keeps_context() {
        let err = QrError::transport("body read error", "unexpected eof");
        assert_eq!(err.to_string(), "body read error: unexpected eof");
    }
}
