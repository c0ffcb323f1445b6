//! pagemeta Generator Library
//!
//! Resolves page metadata and renders it into head tags, the sitemap and
//! robots.txt; resolves Vite assets and redirect rules.
//!
//! # Modules
//!
//! - [`meta`] - Layered metadata resolution per page
//! - [`social`], [`jsonld`], [`robots`], [`opensearch`] - Head tag rendering
//! - [`sitemap`] - Cached XML sitemap generation
//! - [`vite`] - Vite manifest resolution
//! - [`redirects`] - Redirect rules for unmatched requests
//! - [`collector`] - Content directory loading
//! - [`cache`] - Key/value cache for generated documents
//! - [`context`] - Shared configuration, hooks and resources

pub mod cache;
pub mod collector;
pub mod context;
pub mod html;
pub mod jsonld;
pub mod meta;
pub mod opensearch;
pub mod redirects;
pub mod robots;
pub mod sitemap;
pub mod social;
pub mod vite;

pub use cache::{CacheStore, MemoryCache};
pub use collector::SiteLoader;
pub use context::{Context, ContextBuilder, Hooks};
pub use meta::{MetaDefaults, MetaError, PageMeta};
pub use redirects::{RedirectError, RedirectRouter, RedirectTarget, Resolution};
pub use robots::robots_txt;
pub use sitemap::{SitemapBuilder, SitemapError};
pub use vite::{AssetSession, ManifestResolver};
