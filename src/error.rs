//! Error types for the lease form.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document rendering errors. Reported to the user; answers are kept.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template {template} not available")]
    TemplateMissing { template: String },

    #[error("Failed to serialize context: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Session store errors.
///
/// The in-memory store never fails; backends that persist sessions report
/// outages through this type and `FormService::handle` passes them on.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session backend unavailable: {0}")]
    Unavailable(String),
}

/// Raw input failed a field validator.
///
/// Local and non-fatal: the engine re-issues the prompt and leaves the
/// session untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Rejected {
    pub reason: String,
}

impl Rejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
