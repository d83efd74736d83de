//! # Desktop Bridge Implementations
//!
//! Native implementations of bridge traits for desktop and server hosts
//! (Linux, macOS, Windows).
//!
//! ## Overview
//!
//! This crate provides:
//! - `HttpClient` using `reqwest` with rustls, connection pooling and
//!   multipart bodies
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! let http_client = ReqwestHttpClient::with_config(Duration::from_secs(60), None)?;
//! ```

mod http;

pub use http::{ReqwestHttpClient, DEFAULT_TIMEOUT};
