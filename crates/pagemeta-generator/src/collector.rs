//! Content collection.
//!
//! Walks the content directory and builds the [`Site`] page tree. Every
//! subdirectory is a page; the first `*.md` file inside it holds the page's
//! fields and its stem names the template. Directory names may carry a
//! `N_` sort prefix, which is stripped from the slug. `site.md` at the root
//! holds site-wide fields. Images are listed per directory, with optional
//! `<image>.yml` sidecars for dimensions and alt text.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use pagemeta_core::{
    Config, Content, CoreError, Image, MetadataMap, Page, PageOptions, Site,
    frontmatter::{parse_frontmatter, parse_sidecar},
};
use rayon::prelude::*;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// Content collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content file could not be parsed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Content directory is missing.
    #[error("content directory not found: {0}")]
    MissingDir(PathBuf),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "avif", "svg"];

/// Fields that configure the page instead of being content.
const SITEMAP_OPTION: &str = "sitemap";
const METADATA_FIELD: &str = "metadata";

/// Loads a [`Site`] from a content directory.
#[derive(Debug)]
pub struct SiteLoader<'a> {
    config: &'a Config,
    content_dir: PathBuf,
}

/// A page directory, ordered by its sort prefix.
#[derive(Debug)]
struct PageDir {
    path: PathBuf,
    num: Option<u32>,
    slug: String,
}

impl<'a> SiteLoader<'a> {
    /// Create a new loader.
    #[must_use]
    pub fn new(config: &'a Config, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            content_dir: content_dir.into(),
        }
    }

    /// Read the whole content tree.
    pub fn load(&self) -> Result<Site> {
        if !self.content_dir.is_dir() {
            return Err(CollectorError::MissingDir(self.content_dir.clone()));
        }
        info!(dir = %self.content_dir.display(), "loading content");

        let site_url = self.config.site.url.trim_end_matches('/');
        let mut site = Site::new(site_url).with_languages(self.config.site.languages.clone());
        site.error_page = self.config.site.error_page.clone();
        site.home_page = self.config.site.home_page.clone();

        let site_file = self.content_dir.join("site.md");
        if site_file.is_file() {
            let (content, _) = parse_frontmatter(&fs::read_to_string(&site_file)?, &site_file)?;
            site.content = content;
        }
        if site.content_field("title").is_none() {
            if let Some(title) = &self.config.site.title {
                site.content.insert("title".to_string(), Value::from(title.as_str()));
            }
        }
        site.images = self.images(&self.content_dir, &format!("{site_url}/media/site"))?;

        let children = self.children(&self.content_dir, None)?;
        let site = site.with_children(children);

        info!(count = site.index().len(), "loaded pages");
        Ok(site)
    }

    fn children(&self, dir: &Path, parent: Option<&str>) -> Result<Vec<Page>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            let (num, slug) = split_sort_prefix(name);
            dirs.push(PageDir {
                num,
                slug: slug.to_string(),
                path,
            });
        }

        // Numbered pages first in prefix order, then the rest by name.
        dirs.sort_by(|a, b| match (a.num, b.num) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.slug.cmp(&b.slug)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.slug.cmp(&b.slug),
        });

        dirs.par_iter()
            .map(|page_dir| {
                let id = match parent {
                    Some(parent) => format!("{parent}/{}", page_dir.slug),
                    None => page_dir.slug.clone(),
                };
                self.page(&page_dir.path, id)
            })
            .collect()
    }

    fn page(&self, dir: &Path, id: String) -> Result<Page> {
        let content_file = first_markdown(dir)?;

        let mut page = match &content_file {
            Some(file) => {
                let template = file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("default")
                    .to_string();
                let (content, body) = parse_frontmatter(&fs::read_to_string(file)?, file)?;
                let mut page = Page::new(id, template);
                self.apply_content(&mut page, content, body)?;
                page
            }
            None => Page::new(id, "default"),
        };

        let stamp_source = content_file.as_deref().unwrap_or(dir);
        page.modified = modified_time(stamp_source)?;
        page.images = self.images(
            dir,
            &format!("{}/media/pages/{}", self.config.site.url.trim_end_matches('/'), page.id),
        )?;
        page.children = self.children(dir, Some(&page.id))?;

        debug!(id = %page.id, template = %page.template, "loaded page");
        Ok(page)
    }

    fn apply_content(&self, page: &mut Page, mut content: Content, body: String) -> Result<()> {
        if let Some(sitemap) = content.get(SITEMAP_OPTION).and_then(Value::as_bool) {
            page.options = PageOptions { sitemap };
        }

        if let Some(metadata) = content.remove(METADATA_FIELD) {
            let name = format!("{}: metadata", page.id);
            page.metadata = Some(MetadataMap::from_value(&metadata, &name)?);
        }

        let body = body.trim();
        if !body.is_empty() && !content.contains_key("text") {
            content.insert("text".to_string(), Value::from(body));
        }

        page.content = content;
        Ok(())
    }

    fn images(&self, dir: &Path, url_base: &str) -> Result<Vec<Image>> {
        let mut images = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_image(&path) {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let mut image = Image {
                filename: filename.to_string(),
                url: format!("{url_base}/{filename}"),
                ..Image::default()
            };

            let sidecar = dir.join(format!("{filename}.yml"));
            if sidecar.is_file() {
                let fields = parse_sidecar(&fs::read_to_string(&sidecar)?, &sidecar)?;
                image.width = fields.get("width").and_then(as_u32);
                image.height = fields.get("height").and_then(as_u32);
                image.alt = fields
                    .get("alt")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }

            images.push(image);
        }
        images.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(images)
    }
}

/// `3_blog` → `(Some(3), "blog")`.
fn split_sort_prefix(name: &str) -> (Option<u32>, &str) {
    if let Some((num, rest)) = name.split_once('_') {
        if let Ok(num) = num.parse() {
            if !rest.is_empty() {
                return (Some(num), rest);
            }
        }
    }
    (None, name)
}

fn first_markdown(dir: &Path) -> Result<Option<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files.into_iter().next())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn modified_time(path: &Path) -> Result<DateTime<Utc>> {
    let modified: SystemTime = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}
