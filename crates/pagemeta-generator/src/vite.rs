//! Vite asset resolution.
//!
//! Reads the build manifest written by Vite and turns entry names into
//! script and stylesheet tags. Without a readable manifest every URL points
//! at the Vite dev server instead.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use pagemeta_core::Config;
use pagemeta_core::config::ViteServerConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::html;

/// Manifest loading errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed manifest.
    #[error("invalid manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// Path of the dev server client script.
pub const VITE_CLIENT: &str = "@vite/client";

/// One chunk in the Vite manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Output file, relative to the out dir.
    pub file: String,

    #[serde(default)]
    pub src: Option<String>,

    #[serde(default)]
    pub is_entry: bool,

    /// Stylesheets emitted for this chunk.
    #[serde(default)]
    pub css: Vec<String>,

    /// Keys of chunks this one imports.
    #[serde(default)]
    pub imports: Vec<String>,
}

/// Parsed manifest keyed by source path.
pub type Manifest = HashMap<String, ManifestEntry>;

/// Resolves entry names to asset URLs in dev or production mode.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    manifest: Option<Manifest>,
    server: ViteServerConfig,
    out_dir: String,
    site_url: String,
}

impl ManifestResolver {
    /// `{root}/{out_dir}/.vite/manifest.json`.
    pub fn manifest_path(root: &Path, out_dir: &str) -> PathBuf {
        root.join(out_dir).join(".vite").join("manifest.json")
    }

    /// Load the manifest below `root`. Any failure selects dev mode.
    #[must_use]
    pub fn load(root: &Path, config: &Config) -> Self {
        let path = Self::manifest_path(root, &config.vite.out_dir);
        let manifest = match read_manifest(&path) {
            Ok(manifest) => {
                debug!(path = %path.display(), entries = manifest.len(), "loaded Vite manifest");
                Some(manifest)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Vite manifest unavailable");
                None
            }
        };
        Self::from_manifest(manifest, config)
    }

    /// Use an already parsed manifest; `None` selects dev mode.
    #[must_use]
    pub fn from_manifest(manifest: Option<Manifest>, config: &Config) -> Self {
        Self {
            manifest,
            server: config.vite.server.clone(),
            out_dir: config.vite.out_dir.clone(),
            site_url: config.site.url.trim_end_matches('/').to_string(),
        }
    }

    /// Whether assets are served by the dev server.
    pub fn is_dev(&self) -> bool {
        self.manifest.is_none()
    }

    /// Dev server URL for a path.
    pub fn dev_url(&self, path: &str) -> String {
        let scheme = if self.server.https { "https" } else { "http" };
        format!(
            "{scheme}://{}:{}/{}",
            self.server.host,
            self.server.port,
            path.trim_start_matches('/')
        )
    }

    /// Production URL for a built file.
    pub fn prod_url(&self, path: &str) -> String {
        [
            self.site_url.as_str(),
            self.out_dir.trim_matches('/'),
            path.trim_start_matches('/'),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
    }

    fn entry(&self, entry: &str) -> Option<&ManifestEntry> {
        let found = self.manifest.as_ref()?.get(entry);
        if found.is_none() {
            warn!(entry, "entry not found in Vite manifest");
        }
        found
    }

    /// URL of an entry's output file, or its dev server URL.
    pub fn file(&self, entry: &str) -> Option<String> {
        if self.is_dev() {
            return Some(self.dev_url(entry));
        }
        self.entry(entry).map(|e| self.prod_url(&e.file))
    }

    /// Stylesheet URLs for an entry and everything it imports, in discovery
    /// order without duplicates. `None` in dev mode, where Vite injects CSS,
    /// and when nothing was collected.
    pub fn stylesheets(&self, entry: &str) -> Option<Vec<String>> {
        let manifest = self.manifest.as_ref()?;
        let mut visited = HashSet::new();
        let mut files = Vec::new();
        collect_css(manifest, entry, &mut visited, &mut files);
        self.stylesheet_urls(&files)
    }

    fn stylesheet_urls(&self, files: &[String]) -> Option<Vec<String>> {
        if files.is_empty() {
            return None;
        }
        Some(files.iter().map(|file| self.prod_url(file)).collect())
    }

    /// Stylesheet tags for an entry; `None` in dev mode or without CSS.
    pub fn css(&self, entry: &str) -> Option<String> {
        let tags: Vec<_> = self
            .stylesheets(entry)?
            .iter()
            .map(|href| html::stylesheet(href))
            .collect();
        Some(tags.join("\n"))
    }

    /// Script URLs for admin panel entries, dev client first in dev mode.
    pub fn panel_js(&self, entries: &[&str]) -> Vec<String> {
        if self.is_dev() {
            return std::iter::once(VITE_CLIENT)
                .chain(entries.iter().copied())
                .map(|path| self.dev_url(path))
                .collect();
        }
        entries.iter().filter_map(|entry| self.file(entry)).collect()
    }

    /// Stylesheet URLs for admin panel entries; `None` in dev mode or
    /// without CSS.
    pub fn panel_css(&self, entries: &[&str]) -> Option<Vec<String>> {
        let manifest = self.manifest.as_ref()?;
        let mut visited = HashSet::new();
        let mut files = Vec::new();
        for entry in entries {
            collect_css(manifest, entry, &mut visited, &mut files);
        }
        self.stylesheet_urls(&files)
    }

    /// Start rendering assets for one request.
    pub fn session(&self) -> AssetSession<'_> {
        AssetSession {
            resolver: self,
            client_injected: false,
        }
    }
}

fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn collect_css(
    manifest: &Manifest,
    entry: &str,
    visited: &mut HashSet<String>,
    files: &mut Vec<String>,
) {
    if !visited.insert(entry.to_string()) {
        return;
    }
    let Some(chunk) = manifest.get(entry) else {
        return;
    };

    for css in &chunk.css {
        if !files.contains(css) {
            files.push(css.clone());
        }
    }
    for import in &chunk.imports {
        collect_css(manifest, import, visited, files);
    }
}

/// Request-scoped asset rendering.
///
/// Tracks whether the dev client script was already emitted, so it appears
/// once per response no matter how many entries are rendered.
#[derive(Debug)]
pub struct AssetSession<'a> {
    resolver: &'a ManifestResolver,
    client_injected: bool,
}

impl AssetSession<'_> {
    /// Module script tag for an entry.
    ///
    /// In dev mode the first call also emits the Vite client script. `None`
    /// when a production entry is missing from the manifest.
    pub fn js(&mut self, entry: &str) -> Option<String> {
        let resolver = self.resolver;
        if !resolver.is_dev() {
            return resolver.file(entry).map(|src| html::module_script(&src));
        }

        let mut tags = Vec::with_capacity(2);
        if !self.client_injected {
            self.client_injected = true;
            tags.push(html::module_script(&resolver.dev_url(VITE_CLIENT)));
        }
        tags.push(html::module_script(&resolver.dev_url(entry)));
        Some(tags.join("\n"))
    }

    /// Stylesheet tags for an entry; `None` in dev mode or without CSS.
    pub fn css(&self, entry: &str) -> Option<String> {
        self.resolver.css(entry)
    }
}
