//! Per-item outcomes and the pass summary they fold into.

use serde::Serialize;
use std::fmt;

/// Why an item was not transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Basename already in the destination album
    AlreadyPresent,
    /// No capture timestamp under the strict metadata policy
    MissingMetadata,
    /// Video filtered out by configuration
    FilteredVideo,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::AlreadyPresent => "already present",
            SkipReason::MissingMetadata => "missing metadata",
            SkipReason::FilteredVideo => "filtered video",
        };
        f.write_str(reason)
    }
}

/// Result of handling one item; every item yields exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    /// New destination asset
    Uploaded(String),
    /// Destination matched existing content under another name
    Deduplicated(String),
    Failed(String),
}

impl SyncOutcome {
    /// Asset id to add to the destination album, if any.
    pub fn member_id(&self) -> Option<&str> {
        match self {
            SyncOutcome::Uploaded(id) | SyncOutcome::Deduplicated(id) => Some(id),
            _ => None,
        }
    }
}

/// Counts for one album pass.
///
/// `added + skipped + failed + deduplicated == total` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub added: u64,
    pub skipped: u64,
    pub failed: u64,
    pub deduplicated: u64,
    pub total: u64,
    /// Uploaded and deduplicated asset ids, in completion order
    pub member_ids: Vec<String>,
}

impl PassSummary {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        self.total += 1;
        match outcome {
            SyncOutcome::Skipped(_) => self.skipped += 1,
            SyncOutcome::Uploaded(_) => self.added += 1,
            SyncOutcome::Deduplicated(_) => self.deduplicated += 1,
            SyncOutcome::Failed(_) => self.failed += 1,
        }
        if let Some(id) = outcome.member_id() {
            self.member_ids.push(id.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl<'a> FromIterator<&'a SyncOutcome> for PassSummary {
    fn from_iter<I: IntoIterator<Item = &'a SyncOutcome>>(iter: I) -> Self {
        let mut summary = PassSummary::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}
