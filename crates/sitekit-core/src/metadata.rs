//! SEO and social card metadata for pages.
//!
//! Every page gets a title, description, canonical URL and an Open Graph
//! block. Error pages (400, 404, 500) share one layout keyed by status code.

use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::SiteError;
use crate::site::{Page, SiteConfig};

const SOCIAL_IMAGE_PATH: &str = "/assets/img/social.png";
const SOCIAL_IMAGE_WIDTH: u32 = 1200;
const SOCIAL_IMAGE_HEIGHT: u32 = 630;
const FAVICON: &str = "/static/assets/img/favicon.png";
const APPLE_TOUCH_ICON: &str = "/static/assets/img/apple_touch_icon.png";
const LOGO: &str = "/static/assets/img/logos/app.png";

/// Status codes with a dedicated error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPage {
    BadRequest,
    NotFound,
    ServerError,
}

impl ErrorPage {
    /// HTTP status code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::ServerError => 500,
        }
    }

    /// Copy shown under the status code.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::BadRequest => "That was a bad request!",
            Self::NotFound => "We can't find that page!",
            Self::ServerError => "Something went wrong!",
        }
    }
}

impl TryFrom<u16> for ErrorPage {
    type Error = SiteError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            400 => Ok(Self::BadRequest),
            404 => Ok(Self::NotFound),
            500 => Ok(Self::ServerError),
            _ => Err(SiteError::UnknownErrorPage { code }),
        }
    }
}

/// Open Graph image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenGraphImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Open Graph block used by social networks to render link previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub site_name: String,
    pub description: String,
    pub url: String,
    pub images: Vec<OpenGraphImage>,
    pub locale: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Icons referenced from the document head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icons {
    pub icon: String,
    pub apple: String,
}

/// Everything a page needs in its document head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub application_name: String,
    pub authors: Vec<String>,
    pub canonical: String,
    pub icons: Icons,
    pub open_graph: OpenGraph,
}

impl PageMetadata {
    /// Metadata for the landing page.
    #[must_use]
    pub fn for_home(site: &SiteConfig) -> Self {
        let title = format!("{} • {}", site.name, site.tagline);
        Self::build(site, title, site.name.clone(), "/")
    }

    /// Metadata for an ordinary page.
    #[must_use]
    pub fn for_page(site: &SiteConfig, page: &Page) -> Self {
        if page.relative_path == "/" {
            return Self::for_home(site);
        }
        let title = format!("{} • {}", page.name, site.name);
        let site_name = format!("{} • {}", site.name, site.tagline);
        Self::build(site, title, site_name, &page.relative_path)
    }

    /// Metadata for one of the error pages, served at `/<code>`.
    #[must_use]
    pub fn for_error(site: &SiteConfig, error: ErrorPage) -> Self {
        let code = error.code();
        let title = format!("{code} • {}", site.name);
        let site_name = format!("{} • {}", site.name, site.tagline);
        Self::build(site, title, site_name, &format!("/{code}"))
    }

    /// Resolve metadata for a request path.
    ///
    /// `/400`, `/404` and `/500` map to the error pages, other paths must be
    /// one of `pages`.
    #[must_use]
    pub fn for_path(site: &SiteConfig, pages: &[Page], path: &str) -> Option<Self> {
        if path == "/" {
            return Some(Self::for_home(site));
        }
        if let Some(error) = path
            .strip_prefix('/')
            .and_then(|code| code.parse::<u16>().ok())
            .and_then(|code| ErrorPage::try_from(code).ok())
        {
            return Some(Self::for_error(site, error));
        }
        pages
            .iter()
            .find(|p| !p.external && p.relative_path == path)
            .map(|p| Self::for_page(site, p))
    }

    fn build(site: &SiteConfig, title: String, site_name: String, path: &str) -> Self {
        let url = site.url_for(path);
        let year = Utc::now().year();
        Self {
            description: site.description.clone(),
            application_name: site.name.clone(),
            authors: vec![format!("© {} {year}", site.name)],
            canonical: url.clone(),
            icons: Icons {
                icon: FAVICON.to_owned(),
                apple: APPLE_TOUCH_ICON.to_owned(),
            },
            open_graph: OpenGraph {
                title: title.clone(),
                site_name,
                description: site.description.clone(),
                url,
                images: vec![OpenGraphImage {
                    url: format!("{}{SOCIAL_IMAGE_PATH}", site.base_url()),
                    width: SOCIAL_IMAGE_WIDTH,
                    height: SOCIAL_IMAGE_HEIGHT,
                }],
                locale: "en_US".to_owned(),
                kind: "website".to_owned(),
            },
            title,
        }
    }
}

/// JSON-LD blocks for the document head: an `Organization` and a
/// `BreadcrumbList` rooted at the home page.
#[must_use]
pub fn structured_data(site: &SiteConfig) -> Vec<Value> {
    let home = format!("https://www.{}/", site.host());
    vec![
        json!({
            "@context": "https://schema.org",
            "@type": "Organization",
            "url": home,
            "name": site.name,
            "description": site.description,
            "logo": LOGO,
        }),
        json!({
            "@context": "https://schema.org",
            "@type": "BreadcrumbList",
            "itemListElement": [{
                "@type": "ListItem",
                "position": 1,
                "name": "Home",
                "item": home,
            }],
        }),
    ]
}
