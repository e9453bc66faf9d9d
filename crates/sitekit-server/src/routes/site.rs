//! Site metadata routes: `/api/site/*` and `/sitemap.xml`

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitekit_core::metadata::{PageMetadata, structured_data};
use sitekit_core::site::{Page, SiteConfig};
use sitekit_core::sitemap::{render_xml, sitemap};

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/site` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/site/", get(site_info))
        .route("/site/metadata", get(page_metadata))
}

#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub site: SiteConfig,
    pub pages: Vec<Page>,
    pub structured_data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub path: Option<String>,
}

async fn site_info(State(state): State<Arc<AppState>>) -> Json<SiteResponse> {
    Json(SiteResponse {
        site: state.site.clone(),
        pages: state.pages.clone(),
        structured_data: structured_data(&state.site),
    })
}

/// Metadata for `?path=` (default `/`).
async fn page_metadata(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<PageMetadata>, AppError> {
    let path = query.path.as_deref().unwrap_or("/");
    PageMetadata::for_path(&state.site, &state.pages, path)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no page at '{path}'")))
}

/// Rendered sitemap for every internal page.
pub async fn sitemap_xml(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let xml = render_xml(&sitemap(&state.site, &state.pages));
    ([(header::CONTENT_TYPE, "application/xml")], xml)
}
