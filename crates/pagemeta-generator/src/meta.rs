//! Page metadata resolution.
//!
//! [`PageMeta`] answers "what is the value of key K for this page?" by
//! consulting, in order: the page's own metadata, the metadata for its
//! template, the site-wide defaults, the page content and finally the site
//! content. The first layer that defines the key wins outright; layers are
//! never merged.

use std::{fmt, sync::Arc};

use pagemeta_core::{
    CoreError, Field, Image, Language, MetaValue, MetadataMap, Page, Produced, Site,
    content::SITE_MODEL_ID,
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::context::Context;

/// Metadata resolution errors.
#[derive(Debug, Error)]
pub enum MetaError {
    /// Misconfigured metadata.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, MetaError>;

/// Computes the defaults layer per page.
pub type DefaultsProducer = Arc<dyn Fn(&Site, &Page) -> MetadataMap + Send + Sync>;

/// Site-wide default metadata, fixed or computed per page.
#[derive(Clone)]
pub enum MetaDefaults {
    Literal(MetadataMap),
    Producer(DefaultsProducer),
}

impl fmt::Debug for MetaDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(map) => f.debug_tuple("Literal").field(map).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Default sitemap priority.
pub const DEFAULT_PRIORITY: f64 = 0.5;

/// Metadata view of one page.
pub struct PageMeta<'a> {
    ctx: &'a Context,
    site: &'a Site,
    page: &'a Page,
    /// Lowest precedence first.
    layers: Vec<MetadataMap>,
    language: Option<&'a Language>,
}

impl fmt::Debug for PageMeta<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageMeta")
            .field("page", &self.page.id)
            .field("layers", &self.layers.len())
            .field("language", &self.language.map(|l| &l.code))
            .finish()
    }
}

impl<'a> PageMeta<'a> {
    /// Collect the metadata layers for `page`.
    ///
    /// Fails when configured defaults or template metadata are not tables.
    pub fn new(ctx: &'a Context, site: &'a Site, page: &'a Page) -> Result<Self> {
        let mut layers = Vec::with_capacity(3);

        match &ctx.hooks().meta_defaults {
            Some(MetaDefaults::Literal(map)) => layers.push(map.clone()),
            Some(MetaDefaults::Producer(produce)) => layers.push(produce(site, page)),
            None => {
                if let Some(defaults) = &ctx.config().meta.defaults {
                    layers.push(MetadataMap::from_value(defaults, "meta.defaults")?);
                }
            }
        }

        if let Some(templates) = &ctx.config().meta.templates {
            let Some(templates) = templates.as_object() else {
                return Err(CoreError::config("Option `meta.templates` must be a table").into());
            };
            if let Some(template) = templates.get(&page.template) {
                let name = format!("meta.templates.{}", page.template);
                layers.push(MetadataMap::from_value(template, &name)?);
            }
        }

        if let Some(metadata) = &page.metadata {
            layers.push(metadata.clone());
        }

        debug!(page = %page.id, layers = layers.len(), "collected metadata layers");

        Ok(Self {
            ctx,
            site,
            page,
            layers,
            language: site.default_language(),
        })
    }

    /// Render for a specific language. Unknown codes keep the current one.
    #[must_use]
    pub fn with_language(mut self, code: &str) -> Self {
        if let Some(language) = self.site.language(code) {
            self.language = Some(language);
        }
        self
    }

    pub fn context(&self) -> &'a Context {
        self.ctx
    }

    pub fn site(&self) -> &'a Site {
        self.site
    }

    pub fn page(&self) -> &'a Page {
        self.page
    }

    /// The language being rendered; `None` on single-language sites.
    pub fn language(&self) -> Option<&'a Language> {
        self.language
    }

    /// Page URL in the language being rendered.
    pub fn url(&self) -> String {
        self.site
            .url_for(&self.page.id, self.language.map(|lang| lang.code.as_str()))
    }

    /// Resolve `key`, falling back to site content.
    pub fn get(&self, key: &str) -> Field {
        self.get_with(key, true)
    }

    /// Resolve `key`; with `fallback` unset, site content is not consulted.
    ///
    /// A metadata value that is present but empty still wins over content.
    pub fn get_with(&self, key: &str, fallback: bool) -> Field {
        let key = key.to_lowercase();

        if let Some(field) = self.metadata(&key) {
            return field;
        }

        if let Some(value) = self.page.content_field(&key) {
            return Field::new(&self.page.id, key, Some(value.clone()));
        }

        if fallback {
            if let Some(value) = self.site.content_field(&key) {
                return Field::new(SITE_MODEL_ID, key, Some(value.clone()));
            }
        }

        Field::empty(&self.page.id, key)
    }

    /// Shorthand for [`PageMeta::get`].
    pub fn field(&self, name: &str) -> Field {
        self.get(name)
    }

    fn metadata(&self, key: &str) -> Option<Field> {
        let value = self.layers.iter().rev().find_map(|layer| layer.get(key))?;
        Some(match value {
            MetaValue::Literal(value) => Field::new(&self.page.id, key, Some(value.clone())),
            MetaValue::Producer(produce) => match produce(self.page) {
                Produced::Field(field) => field,
                Produced::Value(value) => Field::new(&self.page.id, key, Some(value)),
            },
        })
    }

    /// Sitemap priority in `[0, 1]`, default 0.5. Site content is ignored.
    pub fn priority(&self) -> f64 {
        let priority = self
            .get_with("priority", false)
            .or(DEFAULT_PRIORITY)
            .to_f64()
            .unwrap_or(DEFAULT_PRIORITY);

        if priority.is_finite() {
            // Adding zero turns -0.0 into 0.0.
            priority.clamp(0.0, 1.0) + 0.0
        } else {
            DEFAULT_PRIORITY
        }
    }

    /// Metadata `title`, else the page's custom title, else its title.
    pub fn title(&self) -> String {
        self.metadata("title")
            .and_then(|field| field.to_text())
            .or_else(|| self.page.custom_title())
            .unwrap_or_else(|| self.page.title())
    }

    pub fn description(&self) -> Option<String> {
        self.get("description").to_text()
    }

    /// The thumbnail image: the `thumbnail` field names a file of the model
    /// it was resolved against.
    pub fn thumbnail(&self) -> Option<&'a Image> {
        let field = self.get("thumbnail");
        let filename = match field.value()? {
            Value::String(name) => name.trim(),
            Value::Array(items) => items.first()?.as_str()?.trim(),
            _ => return None,
        };
        let filename = filename.strip_prefix("- ").unwrap_or(filename);

        let images = if field.model() == SITE_MODEL_ID {
            &self.site.images
        } else if field.model() == self.page.id {
            &self.page.images
        } else {
            &self.site.find(field.model())?.images
        };

        images.iter().find(|image| image.filename == filename)
    }

    /// All head tags: robots, social, structured data and search.
    pub fn head(&self) -> Result<String> {
        let mut out = String::new();
        out.push_str(&self.robots());
        out.push_str(&self.social());
        out.push_str(&self.jsonld()?);
        out.push_str(&self.opensearch());
        Ok(out)
    }
}
