// canvas-host/tests/canvas_flow.rs
use actix_web::{test, web, App};
use canvas_core::{sign, Config, ContextBuilder, EmbedConfig, KeyConfig, SigningConfig};
use canvas_host::{api, AppState};
use serde_json::json;

fn test_config(admin_token: Option<&str>) -> Config {
    Config {
        host_addr: "127.0.0.1:0".to_string(),
        admin_token: admin_token.map(str::to_string),
        signing: SigningConfig {
            active_key_id: "k1".to_string(),
            keys: vec![KeyConfig {
                id: "k1".to_string(),
                secret: "an integration test secret with plenty of entropy".to_string(),
            }],
            ttl_secs: 300,
            issuer: "host-platform".to_string(),
            audience: "hello-app".to_string(),
        },
        embed: EmbedConfig {
            allowed_origins: vec!["https://org1.example.com".to_string()],
            app_path: "/app".to_string(),
        },
    }
}

fn state(admin_token: Option<&str>) -> web::Data<AppState> {
    web::Data::new(AppState::from_config(test_config(admin_token)).unwrap())
}

/// Pull the signed_request token out of the embed page's iframe URL.
fn extract_token(html: &str) -> String {
    let start = html
        .find("signed_request=")
        .expect("embed page should carry a signed_request")
        + "signed_request=".len();
    let rest = &html[start..];
    let end = rest.find('"').expect("iframe src should be quoted");
    rest[..end].to_string()
}

#[actix_web::test]
async fn canvas_to_app_flow_authorizes_verified_context() {
    let state = state(None);
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(api::configure),
    )
    .await;

    // 1. Host platform posts the session facts.
    let req = test::TestRequest::post()
        .uri("/canvas")
        .set_json(json!({
            "user_id": "u1",
            "organization_id": "org1",
            "instance_url": "https://org1.example.com",
            "is_sandbox": "true",
            "unknown_field": "should be dropped"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains(r#"event.origin !== "https://org1.example.com""#));
    let token = extract_token(&html);
    assert!(!token.is_empty());

    // 2. The iframe loads the embedded app with the token.
    let req = test::TestRequest::get()
        .uri(&format!("/app?signed_request={}", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Hello, u1!"));
    assert!(html.contains("org1"));
    assert!(html.contains("is_sandbox"));
    assert!(!html.contains("unknown_field"));
    // The raw token never appears in the served content.
    assert!(!html.contains(&token));
}

#[actix_web::test]
async fn missing_subject_is_a_client_error() {
    let app = test::init_service(
        App::new().app_data(state(None)).configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/canvas")
        .set_json(json!({ "organization_id": "org1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "missing required field: user_id");
}

#[actix_web::test]
async fn disallowed_instance_url_is_rejected() {
    let app = test::init_service(
        App::new().app_data(state(None)).configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/canvas")
        .set_json(json!({
            "user_id": "u1",
            "organization_id": "org1",
            "instance_url": "https://attacker.example.net"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn app_without_token_is_a_client_error() {
    let app = test::init_service(
        App::new().app_data(state(None)).configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/app").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn tampered_token_gets_a_generic_unauthorized() {
    let state = state(None);
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/canvas")
        .set_json(json!({ "user_id": "u1", "organization_id": "org1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    let token = extract_token(&html);

    // Corrupt the payload segment.
    let mut tampered = token.clone().into_bytes();
    let mid = tampered.len() / 2;
    tampered[mid] = if tampered[mid] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/app?signed_request={}", tampered))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthorized");
}

#[actix_web::test]
async fn token_for_another_app_is_rejected() {
    let state = state(None);
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(api::configure),
    )
    .await;

    // Sign a token scoped to a different audience with the same key.
    let raw = std::collections::HashMap::from([
        ("user_id".to_string(), "u1".to_string()),
        ("organization_id".to_string(), "org1".to_string()),
    ]);
    let payload = ContextBuilder::new("host-platform", "app-A", 300)
        .build(&raw)
        .unwrap();
    let foreign = sign(&payload, &state.store.active_key().unwrap()).unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/app?signed_request={}", foreign))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn rotation_keeps_outstanding_tokens_valid_until_revoked() {
    let state = state(Some("operator-secret"));
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(api::configure),
    )
    .await;

    // Issue a token under k1.
    let req = test::TestRequest::post()
        .uri("/canvas")
        .set_json(json!({ "user_id": "u1", "organization_id": "org1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    let old_token = extract_token(&html);

    // Rotate to k2.
    let req = test::TestRequest::post()
        .uri("/admin/keys/rotate")
        .insert_header(("X-Admin-Token", "operator-secret"))
        .set_json(json!({ "key_id": "k2", "secret": "a replacement secret with plenty of entropy" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // The k1 token still verifies.
    let req = test::TestRequest::get()
        .uri(&format!("/app?signed_request={}", old_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // Revoke k1; the old token now fails.
    let req = test::TestRequest::post()
        .uri("/admin/keys/revoke")
        .insert_header(("X-Admin-Token", "operator-secret"))
        .set_json(json!({ "key_id": "k1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get()
        .uri(&format!("/app?signed_request={}", old_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn admin_surface_requires_the_configured_token() {
    let app = test::init_service(
        App::new()
            .app_data(state(Some("operator-secret")))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/admin/keys/rotate")
        .set_json(json!({ "key_id": "k2", "secret": "whatever secret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn admin_surface_is_absent_when_not_configured() {
    let app = test::init_service(
        App::new().app_data(state(None)).configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/admin/keys/rotate")
        .insert_header(("X-Admin-Token", "anything"))
        .set_json(json!({ "key_id": "k2", "secret": "whatever secret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
