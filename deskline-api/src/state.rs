//! Shared application state for Axum routers.

use std::sync::Arc;

use deskline_core::MessageEncryptor;
use deskline_storage::Store;

use crate::config::ApiConfig;
use crate::hub::Hub;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend. In-memory by default; swappable behind the trait.
    pub store: Arc<dyn Store>,
    /// Real-time connection hub.
    pub hub: Hub,
    /// Message-content encryptor.
    pub encryptor: Arc<MessageEncryptor>,
    pub config: ApiConfig,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: ApiConfig) -> Self {
        let hub = Hub::new(config.ws_send_buffer);
        let encryptor = Arc::new(MessageEncryptor::new(&config.encryption_secret));
        AppState {
            store,
            hub,
            encryptor,
            config,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(Arc<dyn Store>, store);
crate::impl_from_ref!(Hub, hub);
crate::impl_from_ref!(Arc<MessageEncryptor>, encryptor);
crate::impl_from_ref!(ApiConfig, config);
crate::impl_from_ref!(std::time::Instant, start_time);
