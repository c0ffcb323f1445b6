//! Site configuration management.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    content::Language,
    error::{CoreError, Result},
};

/// Main configuration structure for pagemeta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Pretty-print JSON-LD output.
    #[serde(default)]
    pub debug: bool,

    /// Metadata defaults and social settings.
    #[serde(default)]
    pub meta: MetaConfig,

    /// Sitemap settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// robots.txt settings.
    #[serde(default)]
    pub robots: RobotsConfig,

    /// Vite manifest settings.
    #[serde(default)]
    pub vite: ViteConfig,

    /// Redirect rules, matched in order.
    #[serde(default)]
    pub redirects: Vec<RedirectConfig>,

    /// Environment file location.
    #[serde(default)]
    pub env: EnvConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL for the site (e.g., "https://example.com").
    pub url: String,

    /// Title used when the site content has none.
    #[serde(default)]
    pub title: Option<String>,

    /// Id of the page rendered when nothing else matches.
    #[serde(default = "default_error_page")]
    pub error_page: String,

    /// Id of the page served at the site root.
    #[serde(default = "default_home_page")]
    pub home_page: String,

    /// Languages in declaration order. Empty for single-language sites.
    #[serde(default)]
    pub languages: Vec<Language>,
}

/// Metadata configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaConfig {
    /// Default metadata for every page. Must be a table.
    #[serde(default)]
    pub defaults: Option<Value>,

    /// Metadata per template name. Must be a table of tables.
    #[serde(default)]
    pub templates: Option<Value>,

    /// Twitter handles.
    #[serde(default)]
    pub twitter: TwitterConfig,
}

/// Twitter site and creator handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterHandles {
    #[serde(default)]
    pub site: Option<String>,

    #[serde(default)]
    pub creator: Option<String>,
}

/// Twitter configuration with optional per-language handles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterConfig {
    #[serde(default)]
    pub site: Option<String>,

    #[serde(default)]
    pub creator: Option<String>,

    /// Handles keyed by language code.
    #[serde(default)]
    pub languages: HashMap<String, TwitterHandles>,
}

impl TwitterConfig {
    /// Handles for a language, each falling back to the global handle.
    pub fn handles_for(&self, lang: Option<&str>) -> TwitterHandles {
        let specific = lang.and_then(|code| self.languages.get(code));
        TwitterHandles {
            site: specific
                .and_then(|h| h.site.clone())
                .or_else(|| self.site.clone()),
            creator: specific
                .and_then(|h| h.creator.clone())
                .or_else(|| self.creator.clone()),
        }
    }
}

/// Sitemap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Serve `/sitemap.xml`.
    #[serde(default)]
    pub enable: bool,

    /// A page opted out via `sitemap: false` also hides its descendants.
    #[serde(default)]
    pub hide_descendants: bool,

    #[serde(default)]
    pub exclude: SitemapExclude,
}

/// Sitemap exclusion lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitemapExclude {
    /// Template names never listed.
    #[serde(default)]
    pub templates: Vec<String>,

    /// Page id patterns (regular expressions, case-insensitive, anchored).
    #[serde(default)]
    pub pages: Vec<String>,
}

/// robots.txt configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RobotsConfig {
    /// Serve `/robots.txt`.
    #[serde(default)]
    pub enable: bool,
}

/// Vite integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViteConfig {
    /// Build output directory, relative to the project root.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Development server.
    #[serde(default)]
    pub server: ViteServerConfig,
}

/// Vite development server address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViteServerConfig {
    #[serde(default)]
    pub https: bool,

    #[serde(default = "default_vite_host")]
    pub host: String,

    #[serde(default = "default_vite_port")]
    pub port: u16,
}

/// A single redirect rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Path pattern, e.g. `blog/(:any)`.
    pub from: String,

    /// Target, may contain `$1`, `$2`, ... placeholders.
    pub to: String,
}

/// Environment file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Directory containing the env file. Defaults to the project root.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_env_filename")]
    pub filename: String,
}

fn default_error_page() -> String {
    "error".to_string()
}

fn default_home_page() -> String {
    "home".to_string()
}

fn default_out_dir() -> String {
    "dist".to_string()
}

fn default_vite_host() -> String {
    "localhost".to_string()
}

fn default_vite_port() -> u16 {
    5173
}

fn default_env_filename() -> String {
    ".env".to_string()
}

impl Default for ViteConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            server: ViteServerConfig::default(),
        }
    }
}

impl Default for ViteServerConfig {
    fn default() -> Self {
        Self {
            https: false,
            host: default_vite_host(),
            port: default_vite_port(),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            path: None,
            filename: default_env_filename(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `PAGEMETA__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("PAGEMETA").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.site.url.is_empty() {
            return Err(CoreError::config("site.url cannot be empty"));
        }

        if self.site.url.ends_with('/') {
            tracing::warn!("site.url should not have a trailing slash");
        }

        let mut codes = HashSet::new();
        for lang in &self.site.languages {
            if !codes.insert(lang.code.as_str()) {
                return Err(CoreError::config(format!(
                    "language `{}` is declared twice",
                    lang.code
                )));
            }
        }

        if self.site.languages.iter().filter(|l| l.default).count() > 1 {
            return Err(CoreError::config("only one language can be the default"));
        }

        for (name, value) in [
            ("meta.defaults", &self.meta.defaults),
            ("meta.templates", &self.meta.templates),
        ] {
            if value.as_ref().is_some_and(|v| !v.is_object()) {
                return Err(CoreError::config(format!("Option `{name}` must be a table")));
            }
        }

        Ok(())
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}
