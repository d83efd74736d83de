//! # Bridge Traits
//!
//! Abstractions shared by every crate in the album sync workspace.
//!
//! ## Overview
//!
//! This crate defines the contract between the sync core and the services it
//! talks to. Each trait represents a capability the core requires but that is
//! implemented elsewhere, so the core can be tested against mocks.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP with JSON and multipart bodies
//!
//! ### Services
//! - [`AlbumSource`](album::AlbumSource) - Scrape a shared album and download its media
//! - [`AssetDestination`](destination::AssetDestination) - Albums and uploads on the receiving service
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Implementations
//!
//! | Trait | Implementation Crate |
//! |-------|---------------------|
//! | `HttpClient` | `bridge-desktop` |
//! | `AlbumSource` | `provider-google-photos` |
//! | `AssetDestination` | `provider-immich` |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Provider
//! crates keep their own richer error enums and convert at the trait boundary.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so a single instance can be
//! shared by every worker of a sync pass.

pub mod album;
pub mod destination;
pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use album::{AlbumRecord, AlbumSource, MediaProbe, MediaRecord, ResolvedMedia};
pub use destination::{
    AssetDestination, DestinationAlbum, DestinationAsset, DestinationUser, UploadReceipt,
    UploadRequest,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, MultipartPart};
pub use time::{Clock, FixedClock, SystemClock};
