//! # Scheduler
//!
//! Keeps every configured album in sync on its own interval.
//!
//! Each album runs an independent loop: pass, wait `sync_interval`, repeat.
//! The next deadline is taken after the pass completes, so passes for one
//! album never overlap. A semaphore caps how many albums sync at once.
//! Shutdown is checked only between passes.

use crate::coordinator::AlbumPass;
use crate::outcome::PassSummary;
use crate::{Result, SyncError};
use chrono::{DateTime, NaiveTime, TimeZone};
use core_runtime::config::AlbumConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Interval used when `sync_interval` is missing, invalid or zero
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Parse a compound duration such as `6h`, `1h30m`, `90s` or `250ms`.
///
/// Each component is a non-negative decimal number followed by one of
/// `h`, `m`, `s` or `ms`.
pub fn parse_interval(input: &str) -> Result<Duration> {
    let invalid = || SyncError::InvalidInterval(input.to_string());
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    let mut rest = trimmed;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds = match &rest[..unit_len] {
            "h" => value * 3600.0,
            "m" => value * 60.0,
            "s" => value,
            "ms" => value / 1000.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        let part = Duration::try_from_secs_f64(seconds).map_err(|_| invalid())?;
        total = total.checked_add(part).ok_or_else(invalid)?;
    }

    Ok(total)
}

/// Parsed interval, or [`DEFAULT_SYNC_INTERVAL`] when invalid or zero.
pub fn interval_or_default(input: &str) -> Duration {
    match parse_interval(input) {
        Ok(interval) if !interval.is_zero() => interval,
        Ok(_) => DEFAULT_SYNC_INTERVAL,
        Err(e) => {
            warn!(error = %e, "Falling back to default sync interval");
            DEFAULT_SYNC_INTERVAL
        }
    }
}

/// Parse a `HH:MM` wall-clock time.
pub fn parse_start_time(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map_err(|_| SyncError::InvalidStartTime(input.to_string()))
}

/// Time from `now` until the next occurrence of `start`, today or tomorrow.
pub fn delay_until<Tz: TimeZone>(start: NaiveTime, now: &DateTime<Tz>) -> Duration {
    let now_local = now.naive_local();
    let mut target = now_local.date().and_time(start);
    if target < now_local {
        target += chrono::Duration::days(1);
    }
    (target - now_local).to_std().unwrap_or(Duration::ZERO)
}

/// Drives album passes on their intervals.
pub struct Scheduler {
    runner: Arc<dyn AlbumPass>,
    albums: Vec<AlbumConfig>,
    permits: Arc<Semaphore>,
    start_time: Option<String>,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn AlbumPass>, albums: Vec<AlbumConfig>, album_concurrency: usize) -> Self {
        Self {
            runner,
            albums,
            permits: Arc::new(Semaphore::new(album_concurrency.max(1))),
            start_time: None,
        }
    }

    /// Delay the first pass of every album until this `HH:MM` local time.
    pub fn with_start_time(mut self, start_time: Option<String>) -> Self {
        self.start_time = start_time.filter(|s| !s.trim().is_empty());
        self
    }

    fn initial_delay(&self) -> Duration {
        let Some(raw) = self.start_time.as_deref() else {
            return Duration::ZERO;
        };

        match parse_start_time(raw) {
            Ok(start) => {
                let delay = delay_until(start, &chrono::Local::now());
                info!(
                    start_time = raw,
                    delay_secs = delay.as_secs(),
                    "Waiting for scheduled start time"
                );
                delay
            }
            Err(e) => {
                error!(error = %e, "Ignoring sync_start_time");
                Duration::ZERO
            }
        }
    }

    /// One pass per album, honoring the concurrency ceiling.
    ///
    /// Results are in configuration order.
    pub async fn run_once(&self) -> Vec<Result<PassSummary>> {
        let handles: Vec<_> = self
            .albums
            .iter()
            .cloned()
            .map(|album| {
                let runner = Arc::clone(&self.runner);
                let permits = Arc::clone(&self.permits);
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    run_pass(runner.as_ref(), &album).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (handle, album) in handles.into_iter().zip(&self.albums) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!(album_url = %album.url, error = %e, "Album task failed");
                    results.push(Err(SyncError::Task(e.to_string())));
                }
            }
        }
        results
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        if self.albums.is_empty() {
            warn!("No albums configured");
            return;
        }

        let delay = self.initial_delay();
        if !delay.is_zero() {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let handles: Vec<_> = self
            .albums
            .iter()
            .cloned()
            .map(|album| {
                let runner = Arc::clone(&self.runner);
                let permits = Arc::clone(&self.permits);
                let shutdown = shutdown.clone();
                tokio::spawn(album_loop(runner, permits, album, shutdown))
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Album loop failed");
            }
        }
        info!("Scheduler stopped");
    }
}

async fn album_loop(
    runner: Arc<dyn AlbumPass>,
    permits: Arc<Semaphore>,
    album: AlbumConfig,
    shutdown: CancellationToken,
) {
    let interval = interval_or_default(&album.sync_interval);

    loop {
        let permit = tokio::select! {
            _ = shutdown.cancelled() => break,
            permit = Arc::clone(&permits).acquire_owned() => permit,
        };
        let Ok(permit) = permit else {
            break;
        };

        run_pass(runner.as_ref(), &album).await.ok();
        drop(permit);

        let next_run = chrono::Local::now()
            + chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::days(1));
        info!(
            album_url = %album.url,
            next_run = %next_run.format("%Y-%m-%d %H:%M:%S"),
            "Scheduled next sync"
        );

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

async fn run_pass(runner: &dyn AlbumPass, album: &AlbumConfig) -> Result<PassSummary> {
    let result = runner.sync_album(album).await;
    if let Err(e) = &result {
        error!(album_url = %album.url, error = %e, "Album sync failed");
    }
    result
}
