// canvas-core/src/error.rs
use thiserror::Error;

/// Failure taxonomy for signed-context token handling.
///
/// Verification failures are never echoed to the client verbatim; handlers
/// map them to a generic unauthorized response and log the detail via
/// `tracing` on the server side only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Fatal at startup: key material or another required setting is absent.
    /// Never falls back to a default or empty key.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A required inbound field was missing; names the first absent field.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The payload violated its invariants before signing (internal error).
    #[error("failed to encode context payload: {0}")]
    EncodingError(String),

    /// The token structure could not be parsed at all.
    #[error("malformed token")]
    MalformedToken,

    /// Signature recomputation did not match the token signature.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token expiry is in the past relative to the verification clock.
    #[error("token expired at {expired_at}, current time is {now}")]
    Expired { expired_at: u64, now: u64 },

    /// The token was issued for a different embedded app.
    #[error("audience mismatch: expected '{expected}', got '{actual}'")]
    AudienceMismatch { expected: String, actual: String },

    /// No token was supplied on a gated request.
    #[error("missing signed request token")]
    MissingToken,

    /// The key id named in the token header is not in the verification set.
    /// Covers keys that were fully revoked.
    #[error("no verification key with id '{0}'")]
    KeyNotFound(String),

    /// The key store could not be read.
    #[error("key store unavailable")]
    KeyStoreUnavailable,
}

impl TokenError {
    /// Whether this failure is a client-input problem (4xx) as opposed to an
    /// internal one (5xx).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            TokenError::ConfigurationError(_)
                | TokenError::EncodingError(_)
                | TokenError::KeyStoreUnavailable
        )
    }
}
