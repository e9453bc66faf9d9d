//! Integration tests for the `sitekit` CLI binary.
//!
//! These run the CLI as a subprocess and check exit codes and output. The
//! network commands are pointed at a closed port or at an in-process axum
//! backend on `127.0.0.1:0`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::process::{Command, Output};

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};

const CLOSED_API: &str = "http://127.0.0.1:19999/api";

fn sitekit() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sitekit"));
    for var in [
        "SITEKIT_API_URL",
        "SITEKIT_CSRF_COOKIE",
        "SITEKIT_CSRF_HEADER",
        "SITEKIT_SITE_NAME",
        "SITEKIT_SITE_TAGLINE",
        "SITEKIT_SITE_DESCRIPTION",
        "SITEKIT_SITE_BASE_DOMAIN",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Run with args and return (`exit_code`, stdout, stderr).
fn run(cmd: &mut Command, args: &[&str]) -> (i32, String, String) {
    let Output {
        status,
        stdout,
        stderr,
    } = cmd.args(args).output().expect("failed to execute sitekit");
    (
        status.code().unwrap_or(-1),
        String::from_utf8_lossy(&stdout).to_string(),
        String::from_utf8_lossy(&stderr).to_string(),
    )
}

async fn run_async(mut cmd: Command, args: Vec<String>) -> (i32, String, String) {
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run(&mut cmd, &args)
    })
    .await
    .unwrap()
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn version_flag() {
    let (code, stdout, _) = run(&mut sitekit(), &["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("sitekit"), "unexpected version output: {stdout}");
}

#[test]
fn help_lists_commands() {
    let (code, stdout, _) = run(&mut sitekit(), &["--help"]);
    assert_eq!(code, 0);
    for sub in ["bootstrap", "token", "send", "metadata", "sitemap"] {
        assert!(stdout.contains(sub), "help should list '{sub}': {stdout}");
    }
}

#[test]
fn unknown_command_fails() {
    let (code, _, stderr) = run(&mut sitekit(), &["frobnicate"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("frobnicate"));
}

// ── Offline commands ─────────────────────────────────────────────────

#[test]
fn metadata_for_error_page() {
    let (code, stdout, _) = run(
        sitekit()
            .env("SITEKIT_SITE_NAME", "acme")
            .env("SITEKIT_SITE_BASE_DOMAIN", "acme.test"),
        &["metadata", "/404"],
    );
    assert_eq!(code, 0);
    let meta: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(meta["title"], "404 • Acme");
    assert_eq!(meta["canonical"], "https://acme.test/404");
}

#[test]
fn metadata_defaults_to_home() {
    let (code, stdout, _) = run(sitekit().env("SITEKIT_SITE_NAME", "acme"), &["metadata"]);
    assert_eq!(code, 0);
    let meta: Value = serde_json::from_str(&stdout).unwrap();
    assert!(meta["title"].as_str().unwrap().starts_with("Acme • "));
}

#[test]
fn metadata_unknown_page_fails() {
    let (code, stdout, stderr) = run(&mut sitekit(), &["metadata", "/nope"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("Error:"), "stderr: {stderr}");
}

#[test]
fn sitemap_prints_urlset() {
    let (code, stdout, _) = run(
        sitekit().env("SITEKIT_SITE_BASE_DOMAIN", "https://acme.test"),
        &["sitemap"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("<urlset"));
    assert!(stdout.contains("<loc>https://acme.test</loc>"));
}

// ── Network commands ─────────────────────────────────────────────────

#[test]
fn bootstrap_against_closed_port_fails() {
    let (code, stdout, stderr) = run(&mut sitekit(), &["--api-url", CLOSED_API, "bootstrap"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Error:"), "stderr: {stderr}");
    assert!(stderr.contains("bootstrap"), "stderr: {stderr}");
}

#[test]
fn send_rejects_bad_json() {
    let (code, _, stderr) = run(
        &mut sitekit(),
        &["--api-url", CLOSED_API, "send", "POST", "/items/", "--data", "{nope"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("--data"), "stderr: {stderr}");
}

const TOKEN: &str = "cli-token";

fn backend() -> Router {
    Router::new()
        .route(
            "/api/csrf/",
            get(|| async {
                (
                    [(header::SET_COOKIE, format!("csrftoken={TOKEN}; Path=/"))],
                    StatusCode::OK,
                )
            }),
        )
        .route(
            "/api/get-csrf-token/",
            get(|| async { axum::Json(json!({ "csrftoken": TOKEN })) }),
        )
        .route(
            "/api/items/",
            post(|headers: axum::http::HeaderMap| async move {
                if headers.get("x-csrftoken").and_then(|v| v.to_str().ok()) == Some(TOKEN) {
                    (StatusCode::CREATED, axum::Json(json!({ "ok": true }))).into_response()
                } else {
                    (
                        StatusCode::FORBIDDEN,
                        axum::Json(json!({
                            "detail": "CSRF Failed: CSRF token missing or incorrect."
                        })),
                    )
                        .into_response()
                }
            }),
        )
}

async fn serve() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, backend()).await.unwrap();
    });
    format!("http://{addr}/api")
}

#[tokio::test]
async fn bootstrap_prints_token() {
    let api = serve().await;
    let (code, stdout, _) = run_async(
        sitekit(),
        vec!["--api-url".into(), api, "bootstrap".into()],
    )
    .await;
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), TOKEN);
}

#[tokio::test]
async fn token_reads_api_url_from_env() {
    let api = serve().await;
    let mut cmd = sitekit();
    cmd.env("SITEKIT_API_URL", &api);
    let (code, stdout, _) = run_async(cmd, vec!["token".into()]).await;
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), TOKEN);
}

#[tokio::test]
async fn send_recovers_from_rejection() {
    let api = serve().await;
    let (code, stdout, stderr) = run_async(
        sitekit(),
        vec![
            "--api-url".into(),
            api,
            "send".into(),
            "post".into(),
            "/items/".into(),
            "--data".into(),
            r#"{"name":"x"}"#.into(),
        ],
    )
    .await;
    assert_eq!(code, 0, "stderr: {stderr}");
    let body: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["ok"], true);
}
