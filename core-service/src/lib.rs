//! Core service façade and bootstrap helpers.
//!
//! This crate wires the album source and the asset destination into the
//! sync pipeline. [`bootstrap`] builds the production stack (reqwest
//! transport, Google Photos scraper, Immich client) from an [`AppConfig`];
//! tests hand [`CoreService::new`] their own [`CoreDependencies`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;
use std::time::Duration;

use bridge_desktop::{ReqwestHttpClient, DEFAULT_TIMEOUT};
use bridge_traits::{
    album::AlbumSource,
    destination::{AssetDestination, DestinationUser},
    http::HttpClient,
};
use core_runtime::config::AppConfig;
use core_runtime::events::{CoreEvent, EventBus, ServiceEvent};
use core_sync::{AlbumSyncCoordinator, PassSummary, Scheduler, SyncConfig};
use provider_google_photos::GooglePhotosConnector;
use provider_immich::ImmichConnector;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Aggregated handle to the collaborators the pipeline requires.
pub struct CoreDependencies {
    pub source: Arc<dyn AlbumSource>,
    pub destination: Arc<dyn AssetDestination>,
    pub event_bus: EventBus,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit handles.
    pub fn new(source: Arc<dyn AlbumSource>, destination: Arc<dyn AssetDestination>) -> Self {
        Self {
            source,
            destination,
            event_bus: EventBus::default(),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }
}

/// Primary façade used by the binary.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
    config: Arc<AppConfig>,
}

impl CoreService {
    /// Create a new service from the provided dependencies.
    pub fn new(config: AppConfig, deps: CoreDependencies) -> Self {
        Self {
            deps: Arc::new(deps),
            config: Arc::new(config),
        }
    }

    /// Access the dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn event_bus(&self) -> EventBus {
        self.deps.event_bus.clone()
    }

    /// Verify the destination is reachable and the credentials work.
    #[instrument(skip(self))]
    pub async fn check_connectivity(&self) -> Result<DestinationUser> {
        match self.deps.destination.get_current_user().await {
            Ok(user) => {
                info!(user_id = %user.id, name = %user.name, "Connected to destination");
                self.deps
                    .event_bus
                    .emit(CoreEvent::Service(ServiceEvent::Connected {
                        user_id: user.id.clone(),
                        user_name: user.name.clone(),
                    }))
                    .ok();
                Ok(user)
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to destination");
                Err(CoreError::Connectivity(e))
            }
        }
    }

    fn scheduler(&self) -> Scheduler {
        let coordinator = AlbumSyncCoordinator::new(
            Arc::clone(&self.deps.source),
            Arc::clone(&self.deps.destination),
            self.deps.event_bus.clone(),
            SyncConfig::from(self.config.as_ref()),
        );
        Scheduler::new(
            Arc::new(coordinator),
            self.config.albums.clone(),
            self.config.album_concurrency,
        )
        .with_start_time(self.config.sync_start_time.clone())
    }

    /// Check connectivity, then keep every album in sync until `shutdown`.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(albums = self.config.albums.len(), "Starting album sync");
        self.check_connectivity().await?;

        self.scheduler().run(shutdown).await;

        self.deps
            .event_bus
            .emit(CoreEvent::Service(ServiceEvent::Stopped))
            .ok();
        Ok(())
    }

    /// Check connectivity, then run one pass per album.
    ///
    /// Album failures are reported in the returned list; only the
    /// connectivity check fails the call.
    pub async fn run_once(&self) -> Result<Vec<core_sync::Result<PassSummary>>> {
        self.check_connectivity().await?;
        Ok(self.scheduler().run_once().await)
    }
}

/// Build the production service from a loaded configuration.
///
/// Validates the configuration first.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::AppConfig;
///
/// let mut config = AppConfig::from_file("config.toml")?;
/// config.apply_env_overrides()?;
/// let service = core_service::bootstrap(config)?;
/// service.run_once().await?;
/// # Ok(())
/// # }
/// ```
pub fn bootstrap(config: AppConfig) -> Result<CoreService> {
    config.validate()?;

    let source_http: Arc<dyn HttpClient> = Arc::new(
        ReqwestHttpClient::with_config(DEFAULT_TIMEOUT, None)
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?,
    );
    let destination_timeout = Duration::from_secs(config.destination.timeout_secs);
    let destination_http: Arc<dyn HttpClient> = Arc::new(
        ReqwestHttpClient::with_config(destination_timeout, None)
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?,
    );

    let source = GooglePhotosConnector::new(source_http);
    let destination = ImmichConnector::new(
        destination_http,
        config.destination.api_url.as_str(),
        config.destination.api_key.as_str(),
    )
    .with_timeout(destination_timeout);
    info!(destination = ?destination, "Bootstrapped destination client");

    let deps = CoreDependencies::new(Arc::new(source), Arc::new(destination));
    Ok(CoreService::new(config, deps))
}
