//! Content model: the site, its page tree, languages and images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::field::{MetadataMap, is_empty_value, scalar_to_string};

/// Content fields of a page or the site. Keys are lowercase.
pub type Content = Map<String, Value>;

/// Lowercase all top-level keys of a content map, keeping their order.
pub fn normalize_content(content: Map<String, Value>) -> Content {
    content
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect()
}

/// Look up a non-empty content value by case-insensitive key.
pub fn content_value<'a>(content: &'a Content, key: &str) -> Option<&'a Value> {
    content
        .get(&key.to_lowercase())
        .filter(|value| !is_empty_value(value))
}

/// A configured site language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Language code used in URLs (e.g., "de").
    pub code: String,

    /// Human readable name.
    #[serde(default)]
    pub name: Option<String>,

    /// System locale (e.g., "de_DE.utf8").
    #[serde(default)]
    pub locale: Option<String>,

    /// Whether this is the default language.
    #[serde(default)]
    pub default: bool,
}

impl Language {
    pub fn new(code: impl Into<String>, locale: Option<&str>) -> Self {
        Self {
            code: code.into(),
            name: None,
            locale: locale.map(str::to_string),
            default: false,
        }
    }

    /// The locale, or the language code when no locale is configured.
    pub fn locale_or_code(&self) -> &str {
        self.locale.as_deref().unwrap_or(&self.code)
    }

    /// OpenGraph locale form (`de_DE`).
    pub fn og_locale(&self) -> String {
        self.locale_or_code().replace('-', "_")
    }

    /// Hreflang code for alternate links.
    ///
    /// The `.utf8` / `.utf-8` encoding suffix is dropped and the rest is
    /// slugified: `de_DE.utf8` → `de-de`, `en_US` → `en-us`.
    pub fn hreflang(&self) -> String {
        let locale = self.locale_or_code();
        let lower = locale.to_ascii_lowercase();
        let stripped = [".utf8", ".utf-8"]
            .iter()
            .find_map(|suffix| {
                lower
                    .ends_with(suffix)
                    .then(|| &locale[..locale.len() - suffix.len()])
            })
            .unwrap_or(locale);

        slugify(stripped)
    }
}

/// Lowercase, ASCII-transliterated, hyphen-separated slug.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// An image file attached to a page or the site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// File name inside the page directory.
    pub filename: String,

    /// Public URL.
    pub url: String,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    /// Alternative text.
    #[serde(default)]
    pub alt: Option<String>,
}

/// A resized rendition of an [`Image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumb {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Image {
    /// Scale down proportionally so the width fits `max_width`.
    ///
    /// Images are never upscaled. Without known dimensions the original is
    /// returned unchanged.
    pub fn resize(&self, max_width: u32) -> Thumb {
        match (self.width, self.height) {
            (Some(width), Some(height)) if width > max_width => {
                let scaled = (f64::from(height) * f64::from(max_width) / f64::from(width)).round();
                Thumb {
                    url: thumb_url(&self.url, max_width),
                    width: Some(max_width),
                    height: Some(scaled as u32),
                }
            }
            _ => Thumb {
                url: self.url.clone(),
                width: self.width,
                height: self.height,
            },
        }
    }

    /// Non-empty alt text.
    pub fn alt_text(&self) -> Option<&str> {
        self.alt.as_deref().filter(|alt| !alt.trim().is_empty())
    }
}

/// `photo.jpg` → `photo-1200x.jpg`.
fn thumb_url(url: &str, width: u32) -> String {
    let file_start = url.rfind('/').map_or(0, |i| i + 1);
    match url[file_start..].rfind('.') {
        Some(dot) => {
            let dot = file_start + dot;
            format!("{}-{width}x{}", &url[..dot], &url[dot..])
        }
        None => format!("{url}-{width}x"),
    }
}

/// Per-page options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    /// Whether the page is listed in the sitemap.
    pub sitemap: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self { sitemap: true }
    }
}

/// A content page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Path-like id (e.g., "blog/hello-world").
    pub id: String,

    /// Last id segment.
    pub slug: String,

    /// Template name.
    pub template: String,

    /// Content fields.
    pub content: Content,

    /// Images in the page directory.
    pub images: Vec<Image>,

    /// Modification time of the content file.
    pub modified: DateTime<Utc>,

    pub options: PageOptions,

    /// Page-specific metadata overrides.
    pub metadata: Option<MetadataMap>,

    /// URL in the default language, assigned by [`Site::with_children`].
    pub url: String,

    pub children: Vec<Page>,
}

impl Page {
    pub fn new(id: impl Into<String>, template: impl Into<String>) -> Self {
        let id = id.into();
        let slug = id.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            id,
            slug,
            template: template.into(),
            ..Self::default()
        }
    }

    /// Builder-style content field setter; the key is lowercased.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.content.insert(key.to_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: MetadataMap) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Page>) -> Self {
        self.children = children;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Non-empty content value.
    pub fn content_field(&self, key: &str) -> Option<&Value> {
        content_value(&self.content, key)
    }

    /// The `title` content field, falling back to the slug.
    pub fn title(&self) -> String {
        self.content_field("title")
            .and_then(scalar_to_string)
            .unwrap_or_else(|| self.slug.clone())
    }

    /// The `customTitle` content field, if set.
    pub fn custom_title(&self) -> Option<String> {
        self.content_field("customtitle").and_then(scalar_to_string)
    }

    pub fn image(&self, filename: &str) -> Option<&Image> {
        self.images.iter().find(|image| image.filename == filename)
    }

    /// Modification date as `YYYY-MM-DD`.
    pub fn modified_date(&self) -> String {
        self.modified.format("%Y-%m-%d").to_string()
    }

    fn collect_index<'a>(&'a self, out: &mut Vec<&'a Page>) {
        for child in &self.children {
            out.push(child);
            child.collect_index(out);
        }
    }
}

/// The site: root of the page tree plus site-wide content.
#[derive(Debug, Clone, Default)]
pub struct Site {
    /// Base URL without trailing slash.
    pub url: String,

    /// Site content fields.
    pub content: Content,

    pub images: Vec<Image>,

    /// Top-level pages.
    pub children: Vec<Page>,

    /// Configured languages, in declaration order.
    pub languages: Vec<Language>,

    /// Id of the error page.
    pub error_page: String,

    /// Id of the home page, served at the site root.
    pub home_page: String,
}

/// Id given to fields resolved from site content.
pub const SITE_MODEL_ID: &str = "site";

impl Site {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            error_page: "error".to_string(),
            home_page: "home".to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.content.insert(key.to_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.languages = languages;
        self
    }

    /// Attach the page tree and assign every page its URL.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Page>) -> Self {
        self.children = children;
        self.assign_urls();
        self
    }

    /// Recompute page URLs after the tree or base URL changed.
    pub fn assign_urls(&mut self) {
        let mut children = std::mem::take(&mut self.children);
        for child in &mut children {
            self.assign_url(child);
        }
        self.children = children;
    }

    fn assign_url(&self, page: &mut Page) {
        page.url = self.url_for(&page.id, None);
        for child in &mut page.children {
            self.assign_url(child);
        }
    }

    /// The `title` content field.
    pub fn title(&self) -> String {
        content_value(&self.content, "title")
            .and_then(scalar_to_string)
            .unwrap_or_default()
    }

    /// Non-empty content value.
    pub fn content_field(&self, key: &str) -> Option<&Value> {
        content_value(&self.content, key)
    }

    /// All pages, depth first, parents before children.
    pub fn index(&self) -> Vec<&Page> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            child.collect_index(&mut out);
        }
        out
    }

    pub fn find(&self, id: &str) -> Option<&Page> {
        let id = id.trim_matches('/');
        self.index().into_iter().find(|page| page.id == id)
    }

    pub fn error_page(&self) -> Option<&Page> {
        self.find(&self.error_page)
    }

    pub fn home(&self) -> Option<&Page> {
        self.find(&self.home_page)
    }

    pub fn is_multilang(&self) -> bool {
        !self.languages.is_empty()
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// The language flagged default, else the first one.
    pub fn default_language(&self) -> Option<&Language> {
        self.languages
            .iter()
            .find(|lang| lang.default)
            .or_else(|| self.languages.first())
    }

    /// URL of a page id, optionally in a given language.
    ///
    /// The default language has no code prefix; the home page lives at the
    /// root of each language.
    pub fn url_for(&self, id: &str, lang: Option<&str>) -> String {
        let prefix = match lang {
            Some(code) if self.default_language().is_none_or(|d| d.code != code) => {
                format!("/{code}")
            }
            _ => String::new(),
        };

        if id == self.home_page {
            if prefix.is_empty() {
                return self.url.clone();
            }
            return format!("{}{prefix}", self.url);
        }

        format!("{}{prefix}/{}", self.url, id.trim_matches('/'))
    }

    /// Absolute URL of a site-relative path.
    pub fn url_to(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}
