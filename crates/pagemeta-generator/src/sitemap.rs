//! Sitemap generation.
//!
//! Generates the XML sitemap for search engines from the site's page tree.
//! The finished document is cached under [`SITEMAP_CACHE_KEY`]; invalidation
//! is left to the cache store.

use std::collections::HashSet;

use pagemeta_core::{Page, Site};
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    cache::get_or_try_set,
    context::Context,
    meta::{MetaError, PageMeta},
};

/// Sitemap generation errors.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// An exclusion pattern is not a valid regular expression.
    #[error("invalid sitemap exclusion pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Page metadata could not be resolved.
    #[error(transparent)]
    Meta(#[from] MetaError),
}

/// Result type for sitemap operations.
pub type Result<T> = std::result::Result<T, SitemapError>;

/// Cache key of the generated document.
pub const SITEMAP_CACHE_KEY: &str = "sitemap.xml";

const XHTML_SCHEMA: &str = concat!(
    r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
    r#"xmlns:xhtml="http://www.w3.org/1999/xhtml" "#,
    r#"xsi:schemaLocation="http://www.sitemaps.org/schemas/sitemap/0.9 "#,
    r#"http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd "#,
    r#"http://www.w3.org/1999/xhtml http://www.w3.org/2002/08/xhtml/xhtml1-strict.xsd""#,
);

/// A sitemap URL entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    /// URL location.
    pub loc: String,

    /// Last modification date, `YYYY-MM-DD`.
    pub lastmod: String,

    /// Priority (0.0 to 1.0).
    pub priority: f64,

    /// Change frequency, free text.
    pub changefreq: Option<String>,

    /// Alternate language versions.
    pub alternates: Vec<AlternateLink>,
}

/// Alternate language link for a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateLink {
    /// Hreflang code (e.g., "de-de", "x-default").
    pub hreflang: String,

    /// URL for this language version.
    pub href: String,
}

/// Which pages are left out.
struct Exclusion {
    templates: HashSet<String>,
    pages: Option<Regex>,
    hide_descendants: bool,
}

impl Exclusion {
    fn excludes(&self, page: &Page) -> bool {
        self.templates.contains(&page.template)
            || self.pages.as_ref().is_some_and(|re| re.is_match(&page.id))
            || !page.options.sitemap
    }
}

/// Compile id patterns into one anchored, case-insensitive regex.
fn compile_patterns(patterns: &[String]) -> Result<Option<Regex>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let joined = patterns.join("|");
    RegexBuilder::new(&format!("^(?:{joined})$"))
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|source| SitemapError::Pattern {
            pattern: joined,
            source,
        })
}

/// Sitemap builder.
#[derive(Debug)]
pub struct SitemapBuilder<'a> {
    ctx: &'a Context,
}

impl<'a> SitemapBuilder<'a> {
    /// Create a new sitemap builder.
    #[must_use]
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// The sitemap document, from cache when available.
    pub fn sitemap(&self, site: &Site) -> Result<String> {
        get_or_try_set(self.ctx.cache(), SITEMAP_CACHE_KEY, || self.build(site))
    }

    /// Generate the sitemap document, bypassing the cache.
    pub fn build(&self, site: &Site) -> Result<String> {
        let urls = self.urls(site)?;
        info!(count = urls.len(), "generating sitemap");

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9""#);
        if site.is_multilang() {
            xml.push(' ');
            xml.push_str(XHTML_SCHEMA);
        }
        xml.push_str(">\n");

        for url in &urls {
            xml.push_str(&url_to_xml(url));
        }

        xml.push_str("</urlset>\n");
        Ok(xml)
    }

    /// Entries for every included page, in index order.
    pub fn urls(&self, site: &Site) -> Result<Vec<SitemapUrl>> {
        let exclusion = self.exclusion()?;
        let mut urls = Vec::new();
        self.walk(site, &site.children, &exclusion, &mut urls)?;
        Ok(urls)
    }

    fn exclusion(&self) -> Result<Exclusion> {
        let config = &self.ctx.config().sitemap;
        let patterns = match &self.ctx.hooks().exclude_pages {
            Some(patterns) => patterns.resolve(),
            None => config.exclude.pages.clone(),
        };

        Ok(Exclusion {
            templates: config.exclude.templates.iter().cloned().collect(),
            pages: compile_patterns(&patterns)?,
            hide_descendants: config.hide_descendants,
        })
    }

    fn walk(
        &self,
        site: &Site,
        pages: &[Page],
        exclusion: &Exclusion,
        urls: &mut Vec<SitemapUrl>,
    ) -> Result<()> {
        for page in pages {
            if exclusion.excludes(page) {
                debug!(page = %page.id, "excluded from sitemap");
                if exclusion.hide_descendants && !page.options.sitemap {
                    continue;
                }
            } else {
                urls.push(self.page_to_url(site, page)?);
            }
            self.walk(site, &page.children, exclusion, urls)?;
        }
        Ok(())
    }

    /// Convert a page to a sitemap URL entry.
    fn page_to_url(&self, site: &Site, page: &Page) -> Result<SitemapUrl> {
        let meta = PageMeta::new(self.ctx, site, page)?;

        let alternates = if site.is_multilang() {
            site.languages
                .iter()
                .map(|lang| AlternateLink {
                    hreflang: lang.hreflang(),
                    href: site.url_for(&page.id, Some(&lang.code)),
                })
                .chain(std::iter::once(AlternateLink {
                    hreflang: "x-default".to_string(),
                    href: page.url().to_string(),
                }))
                .collect()
        } else {
            Vec::new()
        };

        Ok(SitemapUrl {
            loc: page.url().to_string(),
            lastmod: page.modified_date(),
            priority: meta.priority(),
            changefreq: meta.get("changefreq").to_text(),
            alternates,
        })
    }
}

/// Convert a URL entry to XML.
fn url_to_xml(url: &SitemapUrl) -> String {
    let mut xml = String::from("  <url>\n");

    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));
    xml.push_str(&format!("    <lastmod>{}</lastmod>\n", url.lastmod));
    xml.push_str(&format!("    <priority>{:.1}</priority>\n", url.priority));

    if let Some(changefreq) = &url.changefreq {
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            escape_xml(changefreq)
        ));
    }

    for alt in &url.alternates {
        xml.push_str(&format!(
            r#"    <xhtml:link rel="alternate" hreflang="{}" href="{}" />"#,
            alt.hreflang,
            escape_xml(&alt.href)
        ));
        xml.push('\n');
    }

    xml.push_str("  </url>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use chrono::{TimeZone, Utc};
    use pagemeta_core::{Config, Language, MetadataMap, PageOptions, Resolvable};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cache::CacheStore;

    fn config(extra: &str) -> Config {
        Config::from_toml_str(&format!(
            "[site]\nurl = \"https://example.com\"\n{extra}"
        ))
        .unwrap()
    }

    fn test_page(id: &str, template: &str) -> Page {
        Page::new(id, template).with_modified(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap())
    }

    fn test_site() -> Site {
        Site::new("https://example.com").with_children(vec![
            test_page("home", "home"),
            test_page("blog", "blog").with_children(vec![
                test_page("blog/first", "article"),
                test_page("blog/second", "article"),
            ]),
            test_page("drafts", "default").with_children(vec![test_page("drafts/wip", "default")]),
            test_page("error", "error"),
        ])
    }

    fn ids(urls: &[SitemapUrl]) -> Vec<&str> {
        urls.iter().map(|u| u.loc.trim_start_matches("https://example.com")).collect()
    }

    #[test]
    fn test_generate_sitemap() {
        let ctx = Context::builder(config(""), ".").build().unwrap();
        let site = test_site();
        let xml = SitemapBuilder::new(&ctx).build(&site).unwrap();

        assert_eq!(
            xml.lines().take(7).collect::<Vec<_>>().join("\n"),
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
                "  <url>\n",
                "    <loc>https://example.com</loc>\n",
                "    <lastmod>2024-03-09</lastmod>\n",
                "    <priority>0.5</priority>\n",
                "  </url>",
            )
        );
        assert!(xml.contains("<loc>https://example.com/blog/second</loc>"));
        assert!(xml.ends_with("</urlset>\n"));
        assert!(!xml.contains("xmlns:xhtml"));
    }

    #[test]
    fn test_exclusions() {
        let ctx = Context::builder(
            config(
                r#"
[sitemap.exclude]
templates = ["error"]
pages = ["BLOG/.*"]
"#,
            ),
            ".",
        )
        .build()
        .unwrap();

        let mut site = test_site();
        site.children[2].options = PageOptions { sitemap: false };

        let urls = SitemapBuilder::new(&ctx).urls(&site).unwrap();
        assert_eq!(ids(&urls), ["", "/blog", "/drafts/wip"]);
    }

    #[test]
    fn test_hide_descendants() {
        let ctx = Context::builder(config("[sitemap]\nhide_descendants = true\n"), ".")
            .build()
            .unwrap();
        let mut site = test_site();
        site.children[2].options = PageOptions { sitemap: false };

        let urls = SitemapBuilder::new(&ctx).urls(&site).unwrap();
        assert_eq!(ids(&urls), ["", "/blog", "/blog/first", "/blog/second", "/error"]);
    }

    #[test]
    fn test_patterns_are_anchored() {
        let ctx = Context::builder(config(""), ".")
            .exclude_pages(vec!["blog".to_string()])
            .build()
            .unwrap();
        let urls = SitemapBuilder::new(&ctx).urls(&test_site()).unwrap();
        assert_eq!(
            ids(&urls),
            ["", "/blog/first", "/blog/second", "/drafts", "/drafts/wip", "/error"]
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let ctx = Context::builder(config(""), ".")
            .exclude_pages(vec!["blog/(".to_string()])
            .build()
            .unwrap();
        let err = SitemapBuilder::new(&ctx).build(&test_site()).unwrap_err();
        assert!(matches!(err, SitemapError::Pattern { .. }));
    }

    #[test]
    fn test_priority_and_changefreq() {
        let ctx = Context::builder(config(""), ".").build().unwrap();
        let site = Site::new("https://example.com")
            .with_field("changefreq", "monthly")
            .with_children(vec![test_page("news", "default").with_metadata(
                MetadataMap::new()
                    .with("priority", 0.83)
                    .with("changefreq", "daily & nightly"),
            )]);

        let xml = SitemapBuilder::new(&ctx).build(&site).unwrap();
        assert!(xml.contains("<priority>0.8</priority>"));
        assert!(xml.contains("<changefreq>daily &amp; nightly</changefreq>"));
    }

    #[test]
    fn test_multilang_sitemap() {
        let ctx = Context::builder(config(""), ".").build().unwrap();
        let mut en = Language::new("en", Some("en_US.utf8"));
        en.default = true;
        let site = Site::new("https://example.com")
            .with_languages(vec![en, Language::new("de", Some("de_DE.utf8"))])
            .with_children(vec![test_page("about", "default")]);

        let xml = SitemapBuilder::new(&ctx).build(&site).unwrap();

        assert!(xml.contains("xmlns:xhtml=\"http://www.w3.org/1999/xhtml\""));
        assert!(xml.contains(
            r#"<xhtml:link rel="alternate" hreflang="en-us" href="https://example.com/about" />"#
        ));
        assert!(xml.contains(
            r#"<xhtml:link rel="alternate" hreflang="de-de" href="https://example.com/de/about" />"#
        ));
        assert!(xml.contains(
            r#"<xhtml:link rel="alternate" hreflang="x-default" href="https://example.com/about" />"#
        ));
    }

    #[test]
    fn test_cached_sitemap_skips_rebuild() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let ctx = Context::builder(config(""), ".")
            .exclude_pages(Resolvable::producer(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                vec!["drafts".to_string()]
            }))
            .build()
            .unwrap();
        let site = test_site();
        let builder = SitemapBuilder::new(&ctx);

        let first = builder.sitemap(&site).unwrap();
        let second = builder.sitemap(&site).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        ctx.cache().flush();
        builder.sitemap(&site).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
    }
}
