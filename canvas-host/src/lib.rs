// canvas-host/src/lib.rs
pub mod api;
pub mod templates;

use std::sync::Arc;

use canvas_core::{Config, ContextBuilder, KeyStore, TokenError, VerificationGate};

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub store: Arc<KeyStore>,
    pub builder: ContextBuilder,
    pub gate: VerificationGate,
}

impl AppState {
    /// Build the state from validated configuration. Fails when the key
    /// material is unusable; the caller treats that as fatal.
    pub fn from_config(config: Config) -> Result<Self, TokenError> {
        config.validate()?;
        let store = Arc::new(config.key_store()?);
        let builder = config.context_builder();
        let gate = VerificationGate::new(Arc::clone(&store), config.signing.audience.clone());
        Ok(Self {
            config,
            store,
            builder,
            gate,
        })
    }
}
