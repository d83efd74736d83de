use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to scrape album {url}: {source}")]
    Source {
        url: String,
        #[source]
        source: BridgeError,
    },

    #[error("Invalid sync interval '{0}'")]
    InvalidInterval(String),

    #[error("Invalid start time '{0}', expected HH:MM")]
    InvalidStartTime(String),

    #[error("Album task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
