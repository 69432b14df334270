// canvas-core/src/context.rs
use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// Host-supplied field names accepted into the custom parameter map. Anything
/// else in the inbound request is dropped, never forwarded.
pub const CUSTOM_PARAM_ALLOW_LIST: &[&str] = &["is_sandbox", "instance_url", "locale", "theme"];

/// Inbound field carrying the subject (user) identity.
pub const FIELD_USER_ID: &str = "user_id";
/// Inbound field carrying the tenant (organization) identity.
pub const FIELD_ORGANIZATION_ID: &str = "organization_id";

/// Current unix time in seconds.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The facts the host platform asserts about the current session, carried as
/// the signed token's claims.
///
/// Invariants: `exp > iat` and `aud` is non-empty. `sign` enforces both
/// before any token is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPayload {
    /// Issuer identity (the host platform).
    pub iss: String,
    /// Subject identity (the user).
    pub sub: String,
    /// Tenant identity (the organization).
    pub org: String,
    /// Audience: the embedded app this token is scoped to.
    pub aud: String,
    /// Issued-at, unix seconds.
    pub iat: u64,
    /// Expiry, unix seconds.
    pub exp: u64,
    /// Unique token id, minted per issuance.
    pub jti: String,
    /// Allow-listed custom parameters. BTreeMap keeps serialization order
    /// deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl ContextPayload {
    /// Check the payload invariants required before signing.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.aud.is_empty() {
            return Err(TokenError::EncodingError("audience is empty".to_string()));
        }
        if self.exp <= self.iat {
            return Err(TokenError::EncodingError(format!(
                "expiry {} is not after issued-at {}",
                self.exp, self.iat
            )));
        }
        Ok(())
    }
}

/// Translates raw host-supplied fields into a `ContextPayload`, validating
/// shape before anything is signed.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    issuer: String,
    audience: String,
    ttl_secs: u64,
}

impl ContextBuilder {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_secs,
        }
    }

    /// Build a payload from the inbound request fields.
    ///
    /// Requires `user_id` and `organization_id`; fails with `MissingField`
    /// naming the first absent one. Extra fields are copied into `params`
    /// only when allow-listed.
    pub fn build(&self, raw: &HashMap<String, String>) -> Result<ContextPayload, TokenError> {
        let sub = require(raw, FIELD_USER_ID)?;
        let org = require(raw, FIELD_ORGANIZATION_ID)?;

        let mut params = BTreeMap::new();
        for key in CUSTOM_PARAM_ALLOW_LIST {
            if let Some(value) = raw.get(*key) {
                params.insert((*key).to_string(), value.clone());
            }
        }

        let iat = now_unix();
        Ok(ContextPayload {
            iss: self.issuer.clone(),
            sub,
            org,
            aud: self.audience.clone(),
            iat,
            exp: iat + self.ttl_secs,
            jti: Uuid::new_v4().to_string(),
            params,
        })
    }
}

fn require(raw: &HashMap<String, String>, field: &str) -> Result<String, TokenError> {
    match raw.get(field) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(TokenError::MissingField(field.to_string())),
    }
}
