//! Dependency initialization and wiring for the clinic search service.

use std::sync::Arc;
use std::time::Duration;

use clinic_search_repository::{
    DisabledSearchEngine, IndexLifecycleManager, OpenSearchEngine, PostgresRecordSource,
    RecordSources, SearchEngine,
};
use sqlx::postgres::PgPoolOptions;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::settings::{AppConfig, ConnectionMode};
use crate::server::state::AppState;
use crate::AppError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub config: AppConfig,
    /// Shared handler state, ready to hand to the router.
    pub state: AppState,
}

impl Dependencies {
    /// Initialize all dependencies from configuration.
    ///
    /// Selects the live engine when `ELASTICSEARCH_ENABLED` is set, otherwise the
    /// disabled one. With a live engine the connection is attempted up to
    /// `max_retries` times; what happens next depends on the connection mode.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If the database is unreachable, the engine client cannot be
    ///   built, or the engine stays unreachable in fail-fast mode
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        info!(
            engine_enabled = config.engine_enabled,
            engine_nodes = ?config.engine.nodes,
            connection_mode = ?config.connection_mode,
            max_retries = config.max_retries,
            database_configured = config.database_url.is_some(),
            server_addr = %config.server_addr,
            "Initializing dependencies"
        );

        let sources = Self::connect_record_sources(&config).await?;

        let engine: Arc<dyn SearchEngine> = if config.engine_enabled {
            let live = OpenSearchEngine::new(&config.engine).map_err(|e| {
                AppError::config(format!("Failed to create search engine client: {}", e))
            })?;
            Arc::new(live)
        } else {
            info!("Search engine disabled by configuration");
            Arc::new(DisabledSearchEngine::new())
        };

        let state = AppState::new(
            engine,
            sources,
            config.engine.shards,
            config.engine.replicas,
            config.operator_token.clone(),
        );

        if config.engine_enabled {
            Self::connect_to_engine(&state, &config).await?;
        }

        Ok(Self { config, state })
    }

    /// Open the primary-store pool and register a source for every index.
    async fn connect_record_sources(config: &AppConfig) -> Result<RecordSources, AppError> {
        let Some(database_url) = &config.database_url else {
            warn!("DATABASE_URL not set, full resync and suggestion fallback are unavailable");
            return Ok(RecordSources::new());
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(database_url)
            .await?;

        info!(
            max_connections = config.database_max_connections,
            "Primary store connection established"
        );

        Ok(PostgresRecordSource::registry(&pool))
    }

    /// Ping the engine with retry logic based on connection mode.
    async fn connect_to_engine(state: &AppState, config: &AppConfig) -> Result<(), AppError> {
        let attempts = config.startup_attempts();
        for attempt in 1..=attempts {
            if state.engine.ping().await {
                info!(attempt = attempt, "Search engine connection established");
                bootstrap_indices(&state.indices).await;
                return Ok(());
            }

            warn!(
                attempt = attempt,
                max_attempts = attempts,
                retry_interval_secs = config.retry_interval.as_secs(),
                "Failed to connect to search engine"
            );
            if attempt < attempts {
                sleep(config.retry_interval).await;
            }
        }

        match config.connection_mode {
            ConnectionMode::FailFast => Err(AppError::config(format!(
                "Search engine unreachable after {} attempts",
                attempts
            ))),
            ConnectionMode::Retry => {
                error!(
                    retry_interval_secs = config.retry_interval.as_secs(),
                    "Search engine unreachable at startup, retrying in the background"
                );
                tokio::spawn(retry_in_background(
                    state.engine.clone(),
                    state.indices.clone(),
                    config.retry_interval,
                ));
                Ok(())
            }
        }
    }
}

async fn retry_in_background(
    engine: Arc<dyn SearchEngine>,
    indices: Arc<IndexLifecycleManager>,
    interval: Duration,
) {
    loop {
        sleep(interval).await;
        if engine.ping().await {
            info!("Search engine connection established");
            bootstrap_indices(&indices).await;
            return;
        }
        warn!(
            retry_interval_secs = interval.as_secs(),
            "Search engine still unreachable, retrying..."
        );
    }
}

/// Create any missing index. Failures are logged; the service keeps running.
async fn bootstrap_indices(indices: &IndexLifecycleManager) {
    match indices.create_clinic_indices().await {
        Ok(report) => info!(
            created = report.created.len(),
            existing = report.existing.len(),
            "Clinic indices checked"
        ),
        Err(e) => warn!(error = %e, "Failed to create clinic indices"),
    }

    if let Err(e) = indices.create_faq_index().await {
        warn!(error = %e, "Failed to create FAQ index");
    }
}
