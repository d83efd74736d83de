//! # Google Photos Shared Album Provider
//!
//! Implements `AlbumSource` for publicly shared Google Photos albums.
//!
//! ## Overview
//!
//! Shared albums have no API. This module provides:
//! - A paced fetch client that absorbs `429` throttling ([`fetch`])
//! - A quote-aware bracket scanner that isolates the inline data literal ([`lexer`])
//! - A loosely-typed value for the positional payload ([`value`])
//! - Versioned page-layout strategies behind [`PageToAlbum`] ([`extractor`])
//! - Original-quality media download with type detection ([`resolver`])

pub mod connector;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod lexer;
pub mod resolver;
pub mod value;

pub use connector::GooglePhotosConnector;
pub use error::{ExtractionError, GooglePhotosError, ResolveError, Result};
pub use extractor::{PageToAlbum, SharedAlbumPageV1};
pub use fetch::{FetchPolicy, ResilientFetchClient, Sleeper, TokioSleeper, BROWSER_USER_AGENT};
pub use resolver::{extension_for_content_type, MediaResolver};
pub use value::LooseValue;
