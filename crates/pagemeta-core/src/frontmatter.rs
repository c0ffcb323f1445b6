//! Frontmatter parsing for content files.

use std::path::Path;

use serde_json::Value;

use crate::{
    content::{Content, normalize_content},
    error::{CoreError, Result},
};

/// Delimiter types for frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML frontmatter delimited by `---`.
    Yaml,
    /// TOML frontmatter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split content into frontmatter and body.
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.trim_start();

    let format = if content.starts_with("---") {
        FrontmatterFormat::Yaml
    } else if content.starts_with("+++") {
        FrontmatterFormat::Toml
    } else {
        return None;
    };

    let delimiter = format.delimiter();

    let after_first = &content[delimiter.len()..];
    let closing_pos = after_first.find(delimiter)?;

    let frontmatter = after_first[..closing_pos].trim();
    let body = after_first[closing_pos + delimiter.len()..].trim_start();

    Some((format, frontmatter, body))
}

/// Parse a content file into its fields and body.
///
/// Field keys are lowercased. A file without frontmatter has no fields and
/// its whole text as body.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(Content, String)> {
    let Some((format, fm_str, body)) = split_frontmatter(content) else {
        return Ok((Content::new(), content.to_string()));
    };

    let value: Value = match format {
        FrontmatterFormat::Yaml => {
            serde_yaml::from_str(fm_str).map_err(|e| CoreError::frontmatter(path, e.to_string()))?
        }
        FrontmatterFormat::Toml => {
            toml::from_str(fm_str).map_err(|e| CoreError::frontmatter(path, e.to_string()))?
        }
    };

    Ok((into_content(value, path)?, body.to_string()))
}

/// Parse a YAML sidecar file (no delimiters) into fields.
pub fn parse_sidecar(content: &str, path: &Path) -> Result<Content> {
    if content.trim().is_empty() {
        return Ok(Content::new());
    }
    let value: Value =
        serde_yaml::from_str(content).map_err(|e| CoreError::frontmatter(path, e.to_string()))?;
    into_content(value, path)
}

fn into_content(value: Value, path: &Path) -> Result<Content> {
    match value {
        Value::Object(map) => Ok(normalize_content(map)),
        Value::Null => Ok(Content::new()),
        _ => Err(CoreError::frontmatter(path, "frontmatter must be a mapping")),
    }
}
