//! # Immich Destination
//!
//! Implements `AssetDestination` for the Immich REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - API-key authenticated requests (`x-api-key`)
//! - Album listing, creation and membership updates
//! - Multipart asset upload with server-side duplicate detection
//! - Best-effort description updates after upload

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{ImmichConnector, DEVICE_ID};
pub use error::{ImmichError, Result};
