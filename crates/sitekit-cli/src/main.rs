//! `sitekit` CLI: command-line front end for the sitekit API client.
//!
//! Bootstraps CSRF sessions, sends requests through the same middleware
//! chain the library uses, and prints page metadata and sitemaps for the
//! site configured through `SITEKIT_SITE_*`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;
use sitekit_client::{ApiRequest, ApiResponse, ClientConfig, SiteClient};
use sitekit_core::metadata::PageMetadata;
use sitekit_core::site::{SiteConfig, default_pages};
use sitekit_core::sitemap::{render_xml, sitemap};
use tracing::debug;

// ── CLI structure ────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "sitekit",
    version,
    about = "sitekit CLI: CSRF session bootstrap, API requests, page metadata and sitemaps",
    long_about = None,
    after_help = "Environment variables:\n  \
         SITEKIT_API_URL           API base URL (default: http://127.0.0.1:8000/api)\n  \
         SITEKIT_CSRF_COOKIE       CSRF cookie name (default: csrftoken)\n  \
         SITEKIT_CSRF_HEADER       CSRF header name (default: X-CSRFToken)\n  \
         SITEKIT_SITE_NAME         Site name used by `metadata` and `sitemap`\n  \
         SITEKIT_SITE_BASE_DOMAIN  Site origin used by `metadata` and `sitemap`\n\n\
         Examples:\n  \
         sitekit bootstrap\n  \
         sitekit send POST /sign-up --data '{\"email\":\"ada@example.com\"}'\n  \
         sitekit metadata /404",
)]
struct Cli {
    /// API base URL.
    #[arg(long, env = "SITEKIT_API_URL", default_value = "")]
    api_url: String,

    /// Log client activity to stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Establish a CSRF session and print the token.
    Bootstrap,
    /// Fetch a token from the legacy token endpoint.
    Token,
    /// Send a request through the CSRF-aware client.
    Send {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE).
        method: String,
        /// Path relative to the API base URL.
        path: String,
        /// JSON request body.
        #[arg(long)]
        data: Option<String>,
    },
    /// Print page metadata as JSON.
    Metadata {
        /// Page path (`/`, `/404`, or a configured page).
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print the sitemap XML.
    Sitemap,
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Bootstrap => cmd_bootstrap(&client(cli.api_url)?).await,
        Commands::Token => cmd_token(&client(cli.api_url)?).await,
        Commands::Send { method, path, data } => {
            cmd_send(&client(cli.api_url)?, &method, &path, data.as_deref()).await
        }
        Commands::Metadata { path } => cmd_metadata(&path),
        Commands::Sitemap => {
            cmd_sitemap();
            Ok(())
        }
    }
}

fn client(api_url: String) -> Result<SiteClient> {
    let client = SiteClient::new(ClientConfig {
        api_url,
        ..ClientConfig::default()
    })
    .context("failed to build client")?;
    debug!(api_url = %client.api_url(), "client ready");
    Ok(client)
}

// ── Commands ─────────────────────────────────────────────────────────

async fn cmd_bootstrap(client: &SiteClient) -> Result<()> {
    client
        .bootstrap()
        .await
        .with_context(|| format!("bootstrap against {} failed", client.api_url()))?;
    let Some(token) = client.csrf_token() else {
        bail!("server did not set a CSRF cookie");
    };
    println!("{token}");
    Ok(())
}

async fn cmd_token(client: &SiteClient) -> Result<()> {
    let token = client
        .fetch_token()
        .await
        .with_context(|| format!("token fetch against {} failed", client.api_url()))?;
    println!("{token}");
    Ok(())
}

async fn cmd_send(
    client: &SiteClient,
    method: &str,
    path: &str,
    data: Option<&str>,
) -> Result<()> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{method}'"))?;

    let mut request = ApiRequest::new(method, path);
    if let Some(data) = data {
        let body: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.json(body);
    }

    let response = client.send(request).await?;
    print_response(&response);
    Ok(())
}

fn cmd_metadata(path: &str) -> Result<()> {
    let site = SiteConfig::from_env();
    let Some(meta) = PageMetadata::for_path(&site, &default_pages(), path) else {
        bail!("no page at '{path}'");
    };
    let value = serde_json::to_value(&meta).context("failed to serialize metadata")?;
    print_json(&value);
    Ok(())
}

fn cmd_sitemap() {
    let site = SiteConfig::from_env();
    println!("{}", render_xml(&sitemap(&site, &default_pages())));
}

// ── Output helpers ───────────────────────────────────────────────────

fn print_response(response: &ApiResponse) {
    debug!(status = %response.status, "response received");
    match response.json::<Value>() {
        Ok(value) => print_json(&value),
        Err(_) => {
            let text = response.text();
            if !text.is_empty() {
                println!("{text}");
            }
        }
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to format JSON: {e}"),
    }
}
