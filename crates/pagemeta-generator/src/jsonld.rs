//! Structured data (JSON-LD) script blocks.

use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};

use crate::meta::{PageMeta, Result};

const SCHEMA_CONTEXT: &str = "https://schema.org";

/// `article` → `Article`.
fn type_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Put `@context` and `@type` first, defaulting both, then every other key.
fn normalize_schema(key: &str, schema: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert(
        "@context".to_string(),
        schema
            .get("@context")
            .cloned()
            .unwrap_or_else(|| Value::from(SCHEMA_CONTEXT)),
    );
    out.insert(
        "@type".to_string(),
        schema
            .get("@type")
            .cloned()
            .unwrap_or_else(|| Value::from(type_name(key))),
    );
    for (name, value) in schema {
        if name != "@context" && name != "@type" {
            out.insert(name.clone(), value.clone());
        }
    }
    out
}

fn to_json(value: &Map<String, Value>, pretty: bool) -> Result<String> {
    if !pretty {
        return Ok(serde_json::to_string(value)?);
    }

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

impl PageMeta<'_> {
    /// One `<script type="application/ld+json">` block per schema in the
    /// `jsonld` field. Non-mapping entries are skipped. Output is pretty
    /// printed when the site runs in debug mode.
    pub fn jsonld(&self) -> Result<String> {
        let field = self.get_with("jsonld", false);
        let Some(schemas) = field.as_object() else {
            return Ok(crate::html::lines(&[]));
        };

        let pretty = self.context().debug();
        let mut tags = Vec::with_capacity(schemas.len() * 3);
        for (key, schema) in schemas {
            let Some(schema) = schema.as_object() else {
                continue;
            };
            tags.push(r#"<script type="application/ld+json">"#.to_string());
            tags.push(to_json(&normalize_schema(key, schema), pretty)?);
            tags.push("</script>".to_string());
        }

        Ok(crate::html::lines(&tags))
    }
}
