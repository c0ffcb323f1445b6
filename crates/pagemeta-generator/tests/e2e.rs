//! End-to-end tests for pagemeta.
//!
//! These tests load the demo site and verify the rendered output.

use std::path::Path;

use pagemeta_core::{Config, Site};
use pagemeta_generator::{
    Context, PageMeta, Resolution, SiteLoader, SitemapBuilder, robots_txt,
};

const DEMO_ROOT: &str = "../../demo/site";

fn load_demo() -> Option<(Context, Site)> {
    let root = Path::new(DEMO_ROOT);
    if !root.exists() {
        // Skip if running from different working directory
        return None;
    }

    let config = Config::load(&root.join("config.toml")).expect("Config should load");
    let site = SiteLoader::new(&config, root.join("content"))
        .load()
        .expect("Content should load");
    let ctx = Context::builder(config, root).build().expect("Context should build");
    Some((ctx, site))
}

#[test]
fn test_demo_site_loads() {
    let Some((ctx, site)) = load_demo() else {
        return;
    };

    assert_eq!(ctx.config().site.url, "https://example.com");
    assert_eq!(site.title(), "Example");
    assert_eq!(site.languages.len(), 2);

    let ids: Vec<_> = site.index().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "home",
            "blog",
            "blog/hello-world",
            "blog/drafts-notes",
            "about",
            "error"
        ]
    );
}

#[test]
fn test_demo_sitemap() {
    let Some((ctx, site)) = load_demo() else {
        return;
    };

    let xml = SitemapBuilder::new(&ctx).sitemap(&site).expect("Sitemap should build");

    assert!(xml.contains("<loc>https://example.com</loc>"));
    assert!(xml.contains("<loc>https://example.com/blog</loc>"));
    assert!(xml.contains("<loc>https://example.com/blog/hello-world</loc>"));
    assert!(!xml.contains("drafts-notes"));
    assert!(!xml.contains("/about<"));
    assert!(!xml.contains("/error<"));

    assert!(xml.contains("<priority>1.0</priority>"));
    assert!(xml.contains("<priority>0.8</priority>"));
    assert!(xml.contains("<changefreq>daily</changefreq>"));
    assert!(xml.contains("<changefreq>weekly</changefreq>"));

    assert!(xml.contains(
        r#"<xhtml:link rel="alternate" hreflang="de-de" href="https://example.com/de/blog/hello-world" />"#
    ));
    assert!(xml.contains(
        r#"<xhtml:link rel="alternate" hreflang="x-default" href="https://example.com/blog/hello-world" />"#
    ));
}

#[test]
fn test_demo_article_head() {
    let Some((ctx, site)) = load_demo() else {
        return;
    };

    let page = site.find("blog/hello-world").expect("Page should exist");
    let head = PageMeta::new(&ctx, &site, page)
        .expect("Metadata should resolve")
        .head()
        .expect("Head should render");

    assert!(head.contains(r#"<meta name="robots" content="index, follow">"#));
    assert!(head.contains(r#"<link rel="canonical" href="https://example.com/blog/hello-world">"#));
    assert!(head.contains(r#"<meta name="description" content="The first post.">"#));
    assert!(head.contains(r#"<meta property="og:type" content="article">"#));
    assert!(head.contains(r#"<meta property="article:published_time" content="2024-01-01">"#));
    assert!(head.contains(r#"<meta property="og:title" content="Hello, World!">"#));
    assert!(head.contains(
        r#"<meta property="og:image" content="https://example.com/media/pages/blog/hello-world/cover-1200x.jpg">"#
    ));
    assert!(head.contains(r#"<meta property="og:image:height" content="630">"#));
    assert!(head.contains(r#"<meta property="og:image:alt" content="A sunrise over the hills">"#));
    assert!(head.contains(r#"<meta name="twitter:card" content="summary_large_image">"#));
    assert!(head.contains(r#"<meta name="twitter:site" content="@example">"#));
    assert!(head.contains(r#"<meta property="og:locale" content="en_US.utf8">"#));
    assert!(head.contains(r#"{"@context":"https://schema.org","@type":"Website","name":"Example","url":"https://example.com"}"#));
    assert!(head.contains(r#"href="https://example.com/open-search.xml""#));
}

#[test]
fn test_demo_page_in_second_language() {
    let Some((ctx, site)) = load_demo() else {
        return;
    };

    let page = site.find("about").expect("Page should exist");
    let social = PageMeta::new(&ctx, &site, page)
        .expect("Metadata should resolve")
        .with_language("de")
        .social();

    assert!(social.contains(r#"<meta property="og:title" content="About this site">"#));
    assert!(social.contains(r#"<meta property="og:url" content="https://example.com/de/about">"#));
    assert!(social.contains(r#"<meta name="twitter:card" content="summary">"#));
    assert!(social.contains(r#"<meta name="twitter:site" content="@example_de">"#));
    assert!(social.contains(r#"<meta property="og:locale:alternate" content="en_US.utf8">"#));
}

#[test]
fn test_demo_assets() {
    let Some((ctx, _)) = load_demo() else {
        return;
    };

    let vite = ctx.vite();
    assert!(!vite.is_dev());

    let mut session = vite.session();
    assert_eq!(
        session.js("src/main.ts").as_deref(),
        Some(r#"<script src="https://example.com/dist/assets/main-4f2a.js" type="module"></script>"#)
    );
    assert_eq!(
        vite.stylesheets("src/main.ts").expect("Production mode"),
        [
            "https://example.com/dist/assets/main-9c1e.css",
            "https://example.com/dist/assets/shared-3d4e.css",
        ]
    );
}

#[test]
fn test_demo_redirects_and_robots() {
    let Some((ctx, site)) = load_demo() else {
        return;
    };

    assert_eq!(
        ctx.redirects().resolve("posts/hello-world", "GET"),
        Resolution::Redirect("https://example.com/blog/hello-world".to_string())
    );
    assert_eq!(
        ctx.redirects().resolve("feed", "GET"),
        Resolution::Redirect("https://feeds.example.com/example".to_string())
    );
    assert_eq!(ctx.redirects().resolve("nowhere", "GET"), Resolution::ErrorPage);

    assert_eq!(
        robots_txt(&site),
        "User-agent: *\nAllow: /\nSitemap: https://example.com/sitemap.xml"
    );
}
