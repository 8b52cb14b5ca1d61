//! Error types shared across devcam crates.

use std::path::PathBuf;

/// Top-level error type for devcam operations.
#[derive(Debug, thiserror::Error)]
pub enum DevcamError {
    #[error("Camera error: {message}")]
    Camera { message: String },

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    #[error("Pipeline setup failed: {message}")]
    PipelineSetup { message: String },

    #[error("{operation} called after the service was destroyed")]
    PreconditionViolation { operation: &'static str },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Protocol violation: {message}")]
    ProtocolViolation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using DevcamError.
pub type DevcamResult<T> = Result<T, DevcamError>;

impl DevcamError {
    pub fn camera(msg: impl Into<String>) -> Self {
        Self::Camera {
            message: msg.into(),
        }
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline {
            message: msg.into(),
        }
    }

    pub fn pipeline_setup(msg: impl Into<String>) -> Self {
        Self::PipelineSetup {
            message: msg.into(),
        }
    }

    pub fn precondition(operation: &'static str) -> Self {
        Self::PreconditionViolation { operation }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error degrades to a neutral value instead of failing the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PreconditionViolation { .. }
                | Self::Unsupported { .. }
                | Self::ProtocolViolation { .. }
        )
    }
}
