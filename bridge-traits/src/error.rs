use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Album page extraction failed: {0}")]
    Extraction(String),

    #[error("Media resolution failed: {0}")]
    Resolve(String),

    #[error("Destination request failed: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, BridgeError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
