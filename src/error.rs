use thiserror::Error;

pub type Result<T> = std::result::Result<T, SentryError>;

/// Errors `main` can hit while bringing the device up or tearing it down.
/// Steady-state failures never surface here; the executor recovers from them
/// locally and records them in the device state.
#[derive(Error, Debug)]
pub enum SentryError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Speech error: {0}")]
    Speech(#[from] crate::speech::SpeechError),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
