use thiserror::Error;

/// Failures opening the webcam. Frame read failures are not represented
/// here; the main loop treats them as transient.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Cannot open camera (tried index {primary} and {fallback})")]
    Unavailable {
        primary: u32,
        fallback: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Failed to connect to the keyboard backend: {0}")]
    Backend(String),

    #[error("Failed to {action} key '{key}': {message}")]
    Inject {
        action: &'static str,
        key: String,
        message: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("Key name is empty")]
    Empty,

    #[error("Unknown key name '{0}' (expected 'space', 'up', or a single character)")]
    Unknown(String),
}
