// canvas-core/src/lib.rs
//
// Signed-context handoff between a host platform and an embedded canvas app:
// key store, token codec, context builder and verification gate, plus the
// configuration and error types shared with the host service.

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod keys;

pub use codec::{sign, verify};
pub use config::{Config, EmbedConfig, KeyConfig, SigningConfig};
pub use context::{ContextBuilder, ContextPayload, CUSTOM_PARAM_ALLOW_LIST};
pub use error::TokenError;
pub use gate::{GateOutcome, VerificationGate};
pub use keys::{KeyMaterial, KeyStore};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Setup tracing for consistent logging across services
pub fn setup_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
