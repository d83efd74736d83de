//! # Album Sync Module
//!
//! Mirrors shared albums into the destination library.
//!
//! ## Components
//!
//! - **Naming** (`naming`): Deterministic upload names and the existing-asset index
//! - **Outcomes** (`outcome`): Per-item results and the pass summary
//! - **Reconciler** (`reconciler`): Worker pool that transfers missing items
//! - **Coordinator** (`coordinator`): One album pass from scrape to membership update
//! - **Scheduler** (`scheduler`): Per-album timers with a concurrency ceiling

pub mod coordinator;
pub mod error;
pub mod job;
pub mod naming;
pub mod outcome;
pub mod reconciler;
pub mod scheduler;

pub use coordinator::{AlbumPass, AlbumSyncCoordinator, SyncConfig};
pub use error::{Result, SyncError};
pub use job::SyncJobId;
pub use naming::{basename, build_index, compose_description, index_key, AssetIndex};
pub use outcome::{PassSummary, SkipReason, SyncOutcome};
pub use reconciler::Reconciler;
pub use scheduler::{
    delay_until, interval_or_default, parse_interval, parse_start_time, Scheduler,
    DEFAULT_SYNC_INTERVAL,
};
