//! Core library for `sitekit`.
//!
//! Holds the pieces shared by the client, the development server, and the
//! CLI: the CSRF cookie/header contract, site-wide constants, SEO and social
//! card metadata, and sitemap generation. Nothing in here performs I/O.

pub mod csrf;
pub mod error;
pub mod metadata;
pub mod site;
pub mod sitemap;
