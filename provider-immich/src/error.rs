//! Error types for the Immich destination

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Immich API errors
#[derive(Error, Debug)]
pub enum ImmichError {
    /// API request returned a non-success status
    #[error("Immich API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Failed to parse API response
    #[error("Failed to parse Immich response: {0}")]
    Parse(String),

    /// The server accepted an upload but returned no asset id
    #[error("upload returned empty ID for {filename}")]
    EmptyAssetId { filename: String },

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Immich operations
pub type Result<T> = std::result::Result<T, ImmichError>;

impl From<ImmichError> for BridgeError {
    fn from(error: ImmichError) -> Self {
        match error {
            ImmichError::BridgeError(e) => e,
            other => BridgeError::Upload(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ImmichError::Api {
            status: 401,
            body: "Invalid API key".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Immich API error (status 401): Invalid API key"
        );
    }

    #[test]
    fn test_error_conversion() {
        let bridge: BridgeError = ImmichError::Parse("missing id".to_string()).into();
        assert!(matches!(bridge, BridgeError::Upload(_)));

        let bridge: BridgeError =
            ImmichError::BridgeError(BridgeError::Transport("Request timed out".to_string()))
                .into();
        assert!(bridge.is_transport());
    }
}
