// canvas-host/src/api/admin.rs
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use canvas_core::KeyMaterial;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

#[derive(Debug, Deserialize)]
pub struct RotateRequest {
    pub key_id: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub key_id: String,
}

/// Check the pre-shared admin token. When none is configured the admin
/// surface does not exist as far as clients can tell.
fn authorize(req: &HttpRequest, state: &AppState) -> Result<(), HttpResponse> {
    let Some(expected) = &state.config.admin_token else {
        return Err(HttpResponse::NotFound().finish());
    };

    let supplied = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    if supplied != Some(expected.as_str()) {
        tracing::warn!("rejected admin request: bad or missing admin token");
        return Err(HttpResponse::Unauthorized().json(json!({ "error": "unauthorized" })));
    }
    Ok(())
}

/// Operator-triggered key rotation: the supplied key becomes active and the
/// previous active key stays valid for verification until revoked.
#[post("/keys/rotate")]
pub async fn rotate_key(
    req: HttpRequest,
    body: web::Json<RotateRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Err(resp) = authorize(&req, &state) {
        return resp;
    }

    if body.key_id.is_empty() || body.secret.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "key_id and secret must be non-empty"
        }));
    }

    let new_key = KeyMaterial::new(body.key_id.clone(), body.secret.clone().into_bytes());
    match state.store.rotate(new_key) {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "success",
            "active_key_id": body.key_id
        })),
        Err(e) => {
            tracing::error!("key rotation failed: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "internal server error"
            }))
        }
    }
}

/// Drop a retired key from the verification set.
#[post("/keys/revoke")]
pub async fn revoke_key(
    req: HttpRequest,
    body: web::Json<RevokeRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Err(resp) = authorize(&req, &state) {
        return resp;
    }

    match state.store.revoke(&body.key_id) {
        Ok(true) => HttpResponse::Ok().json(json!({
            "status": "success",
            "revoked_key_id": body.key_id
        })),
        Ok(false) => HttpResponse::NotFound().json(json!({
            "error": "no retired key with that id"
        })),
        Err(e) => {
            tracing::error!("key revocation failed: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "internal server error"
            }))
        }
    }
}
