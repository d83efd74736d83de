//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the album sync service:
//! - Logging and tracing infrastructure
//! - Configuration loading and validation
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions, the configuration surface, and the
//! event broadcasting mechanism used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{AlbumConfig, AppConfig, DestinationConfig};
pub use error::{Error, Result};
