use crate::recognizer::RecognizerEngine;
use crate::session::SessionConfig;
use crate::store::SessionStore;
use crate::stream::StreamServices;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Registry, store and per-session settings for streaming connections
    pub services: StreamServices,

    /// Allocates one decoder per websocket connection
    pub engine: Arc<dyn RecognizerEngine>,

    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<String>,

    pub service_name: String,
}

impl AppState {
    pub fn new(
        engine: Arc<dyn RecognizerEngine>,
        store: Arc<dyn SessionStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            services: StreamServices::new(store, config),
            engine,
            cors_origins: Vec::new(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}
