use std::time::Duration;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::error::Result;
use crate::kiosk::registry::AttemptRegistry;
use crate::store::SessionStore;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Client for the REST backend.
    pub backend: BackendClient,
    /// Sessions, CSRF tokens and login counters.
    pub store: SessionStore,
    /// Live kiosk attempts.
    pub kiosk: AttemptRegistry,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = SessionStore::connect(&config.session_backend).await?;
        Self::with_store(config, store)
    }

    /// Builds the state around an already connected store.
    pub fn with_store(config: &Config, store: SessionStore) -> Result<Self> {
        let backend = BackendClient::new(
            &config.backend_url,
            Duration::from_secs(config.backend_timeout_secs),
        )?;
        tracing::info!("✅ Backend client ready for {}", backend.base_url());

        let kiosk = AttemptRegistry::new(Duration::from_secs(config.kiosk_attempt_ttl_secs));
        tracing::info!(
            "✅ Kiosk attempt registry initialized (ttl {}s)",
            config.kiosk_attempt_ttl_secs
        );

        Ok(AppState {
            config: config.clone(),
            backend,
            store,
            kiosk,
        })
    }
}
