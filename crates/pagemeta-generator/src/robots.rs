//! Robots directives: the per-page meta tag and the site-wide robots.txt.

use pagemeta_core::Site;

use crate::{html, meta::PageMeta};

/// Body of `/robots.txt`: allow everything and point at the sitemap.
pub fn robots_txt(site: &Site) -> String {
    format!(
        "User-agent: *\nAllow: /\nSitemap: {}",
        site.url_to("sitemap.xml")
    )
}

impl PageMeta<'_> {
    /// Robots meta tag (only when `robots` resolves non-empty) and the
    /// canonical link, which defaults to the page URL.
    pub fn robots(&self) -> String {
        let mut tags = Vec::with_capacity(2);

        if let Some(robots) = self.get("robots").to_text() {
            tags.push(html::meta_name("robots", &robots));
        }

        let canonical = self
            .get("canonical")
            .to_text()
            .unwrap_or_else(|| self.url());
        tags.push(html::void_tag(
            "link",
            &[("rel", Some("canonical")), ("href", Some(&canonical))],
        ));

        html::lines(&tags)
    }
}

#[cfg(test)]
mod tests {
    use pagemeta_core::{Config, Language, MetadataMap, Page};

    use crate::context::Context;

    use super::*;

    fn ctx() -> Context {
        let config = Config::from_toml_str("[site]\nurl = \"https://example.com\"\n").unwrap();
        Context::builder(config, ".").build().unwrap()
    }

    #[test]
    fn test_robots_txt() {
        let site = Site::new("https://example.com/");
        assert_eq!(
            robots_txt(&site),
            "User-agent: *\nAllow: /\nSitemap: https://example.com/sitemap.xml"
        );
    }

    #[test]
    fn test_canonical_defaults_to_page_url() {
        let ctx = ctx();
        let site = Site::new("https://example.com").with_children(vec![Page::new("about", "default")]);
        let page = site.find("about").unwrap();

        assert_eq!(
            PageMeta::new(&ctx, &site, page).unwrap().robots(),
            "<link rel=\"canonical\" href=\"https://example.com/about\">\n"
        );
    }

    #[test]
    fn test_canonical_follows_language() {
        let ctx = ctx();
        let site = Site::new("https://example.com")
            .with_languages(vec![Language::new("en", None), Language::new("de", None)])
            .with_children(vec![Page::new("about", "default")]);
        let page = site.find("about").unwrap();

        let meta = PageMeta::new(&ctx, &site, page).unwrap();
        assert_eq!(
            meta.robots(),
            "<link rel=\"canonical\" href=\"https://example.com/about\">\n"
        );
        assert_eq!(
            meta.with_language("de").robots(),
            "<link rel=\"canonical\" href=\"https://example.com/de/about\">\n"
        );
    }

    #[test]
    fn test_robots_tag_and_canonical_override() {
        let ctx = ctx();
        let site = Site::new("https://example.com")
            .with_field("robots", "index, follow")
            .with_children(vec![Page::new("about", "default").with_metadata(
                MetadataMap::new().with("canonical", "https://example.org/about?a=1&b=2"),
            )]);
        let page = site.find("about").unwrap();

        assert_eq!(
            PageMeta::new(&ctx, &site, page).unwrap().robots(),
            concat!(
                "<meta name=\"robots\" content=\"index, follow\">\n",
                "<link rel=\"canonical\" href=\"https://example.org/about?a=1&amp;b=2\">\n",
            )
        );
    }
}
