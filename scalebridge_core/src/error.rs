use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BridgeError {
    #[error("link error: {0}")]
    Link(String),
    #[error("link fault: {0}")]
    LinkFault(String),
    #[error("timeout waiting for scale")]
    Timeout,
    #[error("sink error: {0}")]
    Sink(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Serialization(e.to_string())
    }
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
