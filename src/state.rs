use std::sync::Arc;

use tracing::info;

use crate::core::config::AppConfig;
use crate::infrastructure::persistence::{Storage, Store, select_store};
use crate::notify::{ContactNotifier, notifier_from_config};

/// Everything a request handler needs, built once per process.
pub struct AppState {
    pub config: AppConfig,
    pub storage: Storage,
    pub notifier: Arc<dyn ContactNotifier>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        notifier: Arc<dyn ContactNotifier>,
    ) -> Self {
        Self {
            config,
            storage: Storage::new(store),
            notifier,
        }
    }

    /// Selects the storage mode and notifier. Never fails: an unreachable
    /// managed store degrades to the in-memory store.
    pub async fn initialize(config: AppConfig) -> Arc<Self> {
        info!("Initializing state...");
        let store = select_store(&config).await;
        let notifier = notifier_from_config(&config);
        info!(mode = %store.mode(), "Storage mode selected");

        Arc::new(Self::new(config, store, notifier))
    }
}
