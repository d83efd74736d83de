//! Error types for the Google Photos shared-album provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// The album page did not have the structure the extractor expects.
///
/// Any of these aborts the album's pass; nothing is recoverable from the page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The `ds:1` data block marker is absent
    #[error("could not find album data (ds:1) in page")]
    MissingAnchor,

    /// No `[` after the data marker
    #[error("could not find start of JSON array")]
    MissingArrayStart,

    /// Bracket depth never returned to zero
    #[error("could not find end of JSON array")]
    UnbalancedArray,

    /// The isolated span is not a valid literal
    #[error("failed to parse album JSON: {0}")]
    MalformedPayload(String),

    /// The payload parsed but its root is not an array
    #[error("album payload root is not an array")]
    UnexpectedRoot,
}

/// One item could not be resolved to downloadable media.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The type probe returned a non-success status
    #[error("media probe failed for {url}: status {status}")]
    ProbeStatus { url: String, status: u16 },

    /// The download returned a non-success status
    #[error("failed to download {kind}: status {status}")]
    DownloadStatus { kind: &'static str, status: u16 },
}

/// Google Photos provider errors
#[derive(Error, Debug)]
pub enum GooglePhotosError {
    /// No response could be obtained after every attempt
    #[error("Network error after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },

    /// The album page itself returned a non-success status
    #[error("failed to fetch album: {status}")]
    PageStatus { status: u16 },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Google Photos operations
pub type Result<T> = std::result::Result<T, GooglePhotosError>;

impl From<GooglePhotosError> for BridgeError {
    fn from(error: GooglePhotosError) -> Self {
        match error {
            GooglePhotosError::Transport { .. } => BridgeError::Transport(error.to_string()),
            GooglePhotosError::PageStatus { .. } => BridgeError::Extraction(error.to_string()),
            GooglePhotosError::Extraction(e) => BridgeError::Extraction(e.to_string()),
            GooglePhotosError::Resolve(e) => BridgeError::Resolve(e.to_string()),
            GooglePhotosError::BridgeError(e) => e,
        }
    }
}
