// canvas-core/src/codec.rs
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::context::ContextPayload;
use crate::error::TokenError;
use crate::keys::{KeyMaterial, KeyStore};

/// Sign a context payload with the given key, producing a compact token.
///
/// The payload invariants are checked first; serialization order is fixed by
/// the struct definition so the signed bytes are deterministic for a given
/// payload and key.
pub fn sign(payload: &ContextPayload, key: &KeyMaterial) -> Result<String, TokenError> {
    payload.validate()?;

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(key.id().to_string());

    encode(&header, payload, &EncodingKey::from_secret(key.secret()))
        .map_err(|e| TokenError::EncodingError(e.to_string()))
}

/// Verify a token against the key store and the supplied clock, returning the
/// embedded payload.
///
/// The header is parsed only far enough to resolve the key id; the signature
/// is recomputed and compared (constant time, inside `jsonwebtoken`) before
/// any claim is released to the caller. Expiry is then checked against `now`
/// so the verification clock is explicit rather than ambient.
pub fn verify(token: &str, store: &KeyStore, now: u64) -> Result<ContextPayload, TokenError> {
    let header = decode_header(token).map_err(|_| TokenError::MalformedToken)?;
    let key_id = header.kid.ok_or(TokenError::MalformedToken)?;
    let key = store.verification_key(&key_id)?;

    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked below against the caller's clock.
    validation.validate_exp = false;
    validation.required_spec_claims = Default::default();

    let data = decode::<ContextPayload>(
        token,
        &DecodingKey::from_secret(key.secret()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::MalformedToken,
    })?;

    let payload = data.claims;
    if now > payload.exp {
        return Err(TokenError::Expired {
            expired_at: payload.exp,
            now,
        });
    }

    Ok(payload)
}
