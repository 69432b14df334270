// canvas-core/src/gate.rs
use std::sync::Arc;

use crate::codec;
use crate::context::{now_unix, ContextPayload};
use crate::error::TokenError;
use crate::keys::KeyStore;

/// Terminal state of the gate for one request.
///
/// `Authorized` releases the verified payload downstream; the raw token never
/// leaves the gate. `Rejected` carries the reason for the server-side log —
/// handlers must map it to a generic client response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Authorized(ContextPayload),
    Rejected(TokenError),
}

impl GateOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GateOutcome::Authorized(_))
    }
}

/// Inbound-request gate: requires a valid, unexpired, correctly-addressed
/// token before embedded content is released.
#[derive(Debug, Clone)]
pub struct VerificationGate {
    store: Arc<KeyStore>,
    expected_audience: String,
}

impl VerificationGate {
    pub fn new(store: Arc<KeyStore>, expected_audience: impl Into<String>) -> Self {
        Self {
            store,
            expected_audience: expected_audience.into(),
        }
    }

    /// Run the gate against the current clock.
    pub fn check(&self, token: Option<&str>) -> GateOutcome {
        self.check_at(token, now_unix())
    }

    /// Run the gate with an explicit verification clock.
    pub fn check_at(&self, token: Option<&str>, now: u64) -> GateOutcome {
        let Some(token) = token else {
            tracing::warn!("gate rejected request: no token supplied");
            return GateOutcome::Rejected(TokenError::MissingToken);
        };

        let payload = match codec::verify(token, &self.store, now) {
            Ok(payload) => payload,
            Err(reason) => {
                tracing::warn!(%reason, "gate rejected token");
                return GateOutcome::Rejected(reason);
            }
        };

        if payload.aud != self.expected_audience {
            tracing::warn!(
                expected = %self.expected_audience,
                actual = %payload.aud,
                "gate rejected token: audience mismatch"
            );
            return GateOutcome::Rejected(TokenError::AudienceMismatch {
                expected: self.expected_audience.clone(),
                actual: payload.aud,
            });
        }

        GateOutcome::Authorized(payload)
    }
}
