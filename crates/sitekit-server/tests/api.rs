//! Integration tests for the `sitekit` server router.
//!
//! Route behavior is checked with `tower::ServiceExt::oneshot` against the
//! router directly; the end-to-end section serves it on an ephemeral port
//! and drives it with `sitekit-client`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use sitekit_client::{ClientConfig, SiteClient};
use sitekit_core::csrf::{CsrfToken, REJECTION_DETAIL};
use sitekit_core::site::{Page, SiteConfig, default_pages};
use sitekit_server::app::build_app;
use sitekit_server::config::ServerConfig;
use sitekit_server::routes;
use sitekit_server::state::AppState;
use tower::ServiceExt;

fn config() -> ServerConfig {
    let mut pages = default_pages();
    pages.push(Page::new("Pricing", "/pricing").unwrap());
    ServerConfig {
        site: SiteConfig {
            name: "Acme".to_owned(),
            tagline: "Rockets".to_owned(),
            description: "We build rockets.".to_owned(),
            base_domain: "https://acme.test".to_owned(),
        },
        pages,
        ..ServerConfig::default()
    }
}

fn app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(&config()).unwrap());
    (routes::router(Arc::clone(&state)), state)
}

async fn call(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn sign_up(email: &str, cookie: Option<&str>, header_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/sign-up")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, format!("csrftoken={cookie}"));
    }
    if let Some(token) = header_token {
        builder = builder.header("X-CSRFToken", token);
    }
    builder
        .body(Body::from(json!({ "email": email }).to_string()))
        .unwrap()
}

// ── CSRF bootstrap ───────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_sets_cookie_and_returns_token() {
    let (app, _) = app();
    let resp = call(&app, get("/api/csrf/")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(cookie.starts_with("csrftoken="));
    assert!(cookie.contains("SameSite=Lax"));

    let body = body_json(resp).await;
    let token = body["csrftoken"].as_str().unwrap();
    assert!(CsrfToken::parse(token).is_ok());
    assert!(cookie.contains(token));
}

#[tokio::test]
async fn bootstrap_keeps_existing_valid_cookie() {
    let (app, _) = app();
    let token = CsrfToken::generate();
    let req = Request::get("/api/get-csrf-token/")
        .header(header::COOKIE, format!("csrftoken={token}"))
        .body(Body::empty())
        .unwrap();

    let body = body_json(call(&app, req).await).await;
    assert_eq!(body["csrftoken"], token.as_str());
}

#[tokio::test]
async fn bootstrap_replaces_malformed_cookie() {
    let (app, _) = app();
    let req = Request::get("/api/csrf/")
        .header(header::COOKIE, "csrftoken=garbage")
        .body(Body::empty())
        .unwrap();

    let body = body_json(call(&app, req).await).await;
    assert_ne!(body["csrftoken"], "garbage");
}

// ── CSRF enforcement ─────────────────────────────────────────────────

#[tokio::test]
async fn mutating_request_without_token_is_rejected() {
    let (app, state) = app();
    let resp = call(&app, sign_up("ada@example.com", None, None)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["detail"], REJECTION_DETAIL);
    assert!(state.signups.read().await.is_empty());
}

#[tokio::test]
async fn malformed_cookie_pairs_are_skipped() {
    let (app, _) = app();
    let token = CsrfToken::generate();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/sign-up")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("junk; =nameless; csrftoken={token}"))
        .header("X-CSRFToken", token.as_str())
        .body(Body::from(json!({ "email": "ada@example.com" }).to_string()))
        .unwrap();
    assert_eq!(call(&app, req).await.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn mismatched_header_is_rejected() {
    let (app, _) = app();
    let cookie = CsrfToken::generate();
    let other = CsrfToken::generate();
    let resp = call(
        &app,
        sign_up("ada@example.com", Some(cookie.as_str()), Some(other.as_str())),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cookie_without_header_is_rejected() {
    let (app, _) = app();
    let cookie = CsrfToken::generate();
    let resp = call(&app, sign_up("ada@example.com", Some(cookie.as_str()), None)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn matching_token_passes() {
    let (app, state) = app();
    let token = CsrfToken::generate();
    let resp = call(
        &app,
        sign_up("Ada@Example.com", Some(token.as_str()), Some(token.as_str())),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["email"], "ada@example.com");
    assert_eq!(state.signups.read().await.len(), 1);
}

// ── Sign-up ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_up_rejects_duplicates_and_bad_emails() {
    let (app, _) = app();
    let token = CsrfToken::generate();
    let t = Some(token.as_str());

    assert_eq!(
        call(&app, sign_up("ada@example.com", t, t)).await.status(),
        StatusCode::CREATED
    );
    let dup = call(&app, sign_up("ADA@example.com", t, t)).await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(dup).await["status_code"], 409);

    let bad = call(&app, sign_up("not-an-email", t, t)).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

// ── Site metadata ────────────────────────────────────────────────────

#[tokio::test]
async fn healthcheck_ok() {
    let (app, _) = app();
    let resp = call(&app, get("/api/healthcheck/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "OK");
}

#[tokio::test]
async fn site_info_lists_pages() {
    let (app, _) = app();
    let body = body_json(call(&app, get("/api/site/")).await).await;
    assert_eq!(body["site"]["name"], "Acme");
    assert_eq!(body["pages"].as_array().unwrap().len(), 2);
    assert_eq!(body["structured_data"][0]["@type"], "Organization");
}

#[tokio::test]
async fn metadata_by_path() {
    let (app, _) = app();

    let home = body_json(call(&app, get("/api/site/metadata")).await).await;
    assert_eq!(home["title"], "Acme • Rockets");

    let not_found = body_json(call(&app, get("/api/site/metadata?path=/404")).await).await;
    assert_eq!(not_found["title"], "404 • Acme");
    assert_eq!(not_found["canonical"], "https://acme.test/404");

    let pricing = body_json(call(&app, get("/api/site/metadata?path=/pricing")).await).await;
    assert_eq!(pricing["title"], "Pricing • Acme");

    let missing = call(&app, get("/api/site/metadata?path=/nope")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sitemap_is_xml() {
    let (app, _) = app();
    let resp = call(&app, get("/sitemap.xml")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let xml = body_text(resp).await;
    assert!(xml.contains("<loc>https://acme.test</loc>"));
    assert!(xml.contains("<loc>https://acme.test/pricing</loc>"));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (app, _) = app();
    let resp = call(&app, get("/api/does-not-exist/")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["status_code"], 404);
    assert_eq!(body["detail"], "Not found.");
}

// ── Full stack ───────────────────────────────────────────────────────

#[tokio::test]
async fn stack_sets_security_headers() {
    let state = Arc::new(AppState::new(&config()).unwrap());
    let app = build_app(&config(), state).unwrap();

    let resp = call(&app, get("/api/healthcheck/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(resp.headers()[header::X_FRAME_OPTIONS], "DENY");
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn cors_preflight_allows_configured_csrf_header() {
    let config = ServerConfig {
        header_name: "X-Site-Token".to_owned(),
        allowed_origin: Some("https://app.acme.test".to_owned()),
        ..config()
    };
    let state = Arc::new(AppState::new(&config).unwrap());
    let app = build_app(&config, state).unwrap();

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/sign-up")
        .header(header::ORIGIN, "https://app.acme.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-site-token")
        .body(Body::empty())
        .unwrap();
    let resp = call(&app, preflight).await;

    let headers = resp.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.acme.test"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
    assert!(allowed.contains("x-site-token"), "allowed headers: {allowed}");
}

#[test]
fn stack_rejects_bad_origin() {
    let config = ServerConfig {
        allowed_origin: Some("bad\norigin".to_owned()),
        ..config()
    };
    let state = Arc::new(AppState::new(&config).unwrap());
    assert!(build_app(&config, state).is_err());
}

// ── End to end with sitekit-client ───────────────────────────────────

async fn serve() -> (String, Arc<AppState>) {
    let (app, state) = app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), state)
}

fn client(api_url: String) -> SiteClient {
    SiteClient::new(ClientConfig {
        api_url,
        cookie_name: "csrftoken".to_owned(),
        header_name: "X-CSRFToken".to_owned(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn client_signs_up_after_initialize() {
    let (url, state) = serve().await;
    let client = client(url);

    client.initialize().await;
    assert!(client.csrf_token().is_some());

    let resp = client
        .post("/sign-up", json!({ "email": "grace@example.com" }))
        .await
        .unwrap();
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(state.signups.read().await[0].email, "grace@example.com");
}

#[tokio::test]
async fn client_recovers_without_initialize() {
    let (url, state) = serve().await;
    let client = client(url);

    assert!(client.csrf_token().is_none());
    let resp = client
        .post("/sign-up", json!({ "email": "linus@example.com" }))
        .await
        .unwrap();
    assert_eq!(resp.status, StatusCode::CREATED);
    assert!(client.csrf_token().is_some());
    assert_eq!(state.signups.read().await.len(), 1);
}

#[tokio::test]
async fn client_sees_conflict_without_retry() {
    let (url, _) = serve().await;
    let client = client(url);
    client.initialize().await;

    client
        .post("/sign-up", json!({ "email": "ken@example.com" }))
        .await
        .unwrap();
    let err = client
        .post("/sign-up", json!({ "email": "ken@example.com" }))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert!(!err.is_csrf_rejection());
}
