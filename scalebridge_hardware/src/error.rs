use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("cannot open scale port: {0}")]
    Open(String),
    #[error("scale timeout")]
    Timeout,
    #[error("scale port closed")]
    Closed,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
