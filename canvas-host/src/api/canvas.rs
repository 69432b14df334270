// canvas-host/src/api/canvas.rs
use std::collections::HashMap;

use actix_web::{get, post, web, Either, HttpResponse, Responder};
use canvas_core::{sign, GateOutcome, TokenError};
use serde_json::json;

use crate::templates;
use crate::AppState;

type RawFields = Either<web::Json<HashMap<String, String>>, web::Form<HashMap<String, String>>>;

#[get("/healthz")]
pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "canvas-host",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok"
    }))
}

/// Entry point called by the host platform: builds the context from the
/// request body, signs it with the active key, and returns the page that
/// embeds the canvas app with the token in the iframe URL.
#[post("/canvas")]
pub async fn canvas(body: RawFields, state: web::Data<AppState>) -> impl Responder {
    let raw = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    // The instance URL must match the configured allow-list exactly; the
    // page's postMessage origin check uses the configured value, never an
    // unvalidated echo of the request field.
    let expected_origin = match raw.get("instance_url") {
        Some(url) if state.config.is_allowed_origin(url) => url.clone(),
        Some(url) => {
            tracing::warn!(instance_url = %url, "rejected canvas request: origin not allow-listed");
            return HttpResponse::BadRequest().json(json!({
                "error": "instance_url is not an allowed origin"
            }));
        }
        None => state.config.embed.allowed_origins[0].clone(),
    };

    let payload = match state.builder.build(&raw) {
        Ok(payload) => payload,
        Err(e @ TokenError::MissingField(_)) => {
            tracing::warn!("rejected canvas request: {}", e);
            return HttpResponse::BadRequest().json(json!({ "error": e.to_string() }));
        }
        Err(e) => {
            tracing::error!("failed to build context payload: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "internal server error"
            }));
        }
    };

    let key = match state.store.active_key() {
        Ok(key) => key,
        Err(e) => {
            tracing::error!("no usable signing key: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "internal server error"
            }));
        }
    };

    let token = match sign(&payload, &key) {
        Ok(token) => token,
        Err(e) => {
            // Payload detail stays out of the log line.
            tracing::error!("failed to sign context token: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "internal server error"
            }));
        }
    };

    tracing::info!(
        subject = %payload.sub,
        org = %payload.org,
        key_id = %key.id(),
        "issued signed context token"
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(templates::embed_page(
            &token,
            &state.config.embed.app_path,
            &expected_origin,
        ))
}

/// The embedded app itself, loaded by the iframe. Content is released only
/// after the verification gate authorizes the token; every rejection maps to
/// a generic client response with the reason kept in the server log.
#[get("/app")]
pub async fn app(
    query: web::Query<HashMap<String, String>>,
    state: web::Data<AppState>,
) -> impl Responder {
    let token = query.get("signed_request").map(String::as_str);

    match state.gate.check(token) {
        GateOutcome::Authorized(payload) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(templates::app_page(&payload)),
        GateOutcome::Rejected(TokenError::MissingToken) => {
            HttpResponse::BadRequest().json(json!({
                "error": "missing signed_request parameter"
            }))
        }
        GateOutcome::Rejected(reason) if reason.is_client_error() => {
            // The gate already logged the reason; the client learns nothing
            // about signature internals.
            HttpResponse::Unauthorized().json(json!({ "error": "unauthorized" }))
        }
        GateOutcome::Rejected(reason) => {
            tracing::error!("gate failed internally: {}", reason);
            HttpResponse::InternalServerError().json(json!({
                "error": "internal server error"
            }))
        }
    }
}
