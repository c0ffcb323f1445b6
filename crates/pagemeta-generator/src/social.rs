//! Social sharing tags: plain meta, OpenGraph and Twitter cards.

use serde_json::{Map, Value};

use crate::{html, meta::PageMeta};

/// Bounding width for share images.
pub const SHARE_IMAGE_WIDTH: u32 = 1200;

/// Key prefix that selects a non-`og` OpenGraph namespace.
const NAMESPACE_MARKER: &str = "namespace:";

const LARGE_CARD: &str = "summary_large_image";

/// Insert `value` unless `key` already holds a non-null value.
fn set_default(map: &mut Map<String, Value>, key: &str, value: impl Into<Value>) {
    match map.get_mut(key) {
        Some(existing) if !existing.is_null() => {}
        Some(existing) => *existing = value.into(),
        None => {
            map.insert(key.to_string(), value.into());
        }
    }
}

/// Emit one tag per scalar, one per list element; nulls produce nothing.
fn push_values(tags: &mut Vec<String>, value: &Value, tag: &dyn Fn(&str) -> String) {
    match value {
        Value::Null | Value::Object(_) => {}
        Value::Array(items) => {
            for item in items {
                if let Some(text) = pagemeta_core::field::scalar_to_string(item) {
                    tags.push(tag(&text));
                }
            }
        }
        scalar => {
            if let Some(text) = pagemeta_core::field::scalar_to_string(scalar) {
                tags.push(tag(&text));
            }
        }
    }
}

impl PageMeta<'_> {
    fn mapping(&self, key: &str) -> Map<String, Value> {
        self.get_with(key, false)
            .into_value()
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Meta, OpenGraph and Twitter tags for the page.
    ///
    /// Explicit values from the `meta`, `opengraph` and `twitter` fields are
    /// kept as given; computed defaults only fill keys that are absent.
    pub fn social(&self) -> String {
        let mut meta = self.mapping("meta");
        let mut opengraph = self.mapping("opengraph");
        let mut twitter = self.mapping("twitter");

        let page = self.page();
        let title = page.custom_title().unwrap_or_else(|| page.title());

        set_default(&mut opengraph, "site_name", self.site().title());
        set_default(&mut opengraph, "url", self.url());
        set_default(&mut opengraph, "type", "website");
        set_default(&mut opengraph, "title", title.as_str());

        set_default(&mut twitter, "card", LARGE_CARD);
        set_default(&mut twitter, "title", title);

        let language = self.language().map(|lang| lang.code.as_str());
        let handles = self.context().config().meta.twitter.handles_for(language);
        if let Some(site) = handles.site.filter(|s| !s.is_empty()) {
            set_default(&mut twitter, "site", site);
        }
        if let Some(creator) = handles.creator.filter(|c| !c.is_empty()) {
            set_default(&mut twitter, "creator", creator);
        }

        if let Some(description) = self.description() {
            set_default(&mut meta, "description", description.as_str());
            set_default(&mut opengraph, "description", description.as_str());
            set_default(&mut twitter, "description", description);
        }

        if let Some(image) = self.thumbnail() {
            let thumb = image.resize(SHARE_IMAGE_WIDTH);
            set_default(&mut opengraph, "image", thumb.url.as_str());
            if let Some(width) = thumb.width {
                set_default(&mut opengraph, "image:width", width);
            }
            if let Some(height) = thumb.height {
                set_default(&mut opengraph, "image:height", height);
            }
            set_default(&mut twitter, "image", thumb.url);

            if let Some(alt) = image.alt_text() {
                set_default(&mut opengraph, "image:alt", alt);
                set_default(&mut twitter, "image:alt", alt);
            }
        } else if twitter.get("image").is_none_or(Value::is_null)
            && twitter.get("card").and_then(Value::as_str) == Some(LARGE_CARD)
        {
            twitter.insert("card".to_string(), Value::from("summary"));
        }

        if self.site().is_multilang() {
            if let Some(current) = self.language() {
                set_default(&mut opengraph, "locale", current.og_locale());

                let alternates: Vec<Value> = self
                    .site()
                    .languages
                    .iter()
                    .filter(|lang| lang.code != current.code)
                    .map(|lang| Value::from(lang.og_locale()))
                    .collect();
                if !alternates.is_empty() {
                    set_default(&mut opengraph, "locale:alternate", alternates);
                }
            }
        }

        let mut tags = Vec::new();

        for (name, content) in &meta {
            push_values(&mut tags, content, &|text| html::meta_name(name, text));
        }

        for (property, content) in &opengraph {
            match content {
                Value::Object(nested) => {
                    let prefix = match property.strip_prefix(NAMESPACE_MARKER) {
                        Some(namespace) => namespace.to_string(),
                        None => format!("og:{property}"),
                    };
                    for (sub, sub_content) in nested {
                        let name = format!("{prefix}:{sub}");
                        push_values(&mut tags, sub_content, &|text| {
                            html::meta_property(&name, text)
                        });
                    }
                }
                _ => {
                    let name = format!("og:{property}");
                    push_values(&mut tags, content, &|text| html::meta_property(&name, text));
                }
            }
        }

        for (name, content) in &twitter {
            let name = format!("twitter:{name}");
            push_values(&mut tags, content, &|text| html::meta_name(&name, text));
        }

        html::lines(&tags)
    }
}
