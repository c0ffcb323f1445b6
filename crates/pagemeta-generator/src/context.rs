//! Per-process context shared by every request.
//!
//! Holds the configuration, the programmatic hooks that cannot live in a
//! config file, the sitemap cache, the loaded asset manifest and the
//! compiled redirect rules. Build it once with [`Context::builder`] and pass
//! it by reference.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use pagemeta_core::{Config, Env, MetadataMap, Page, Resolvable, Site};
use tracing::{debug, warn};

use crate::{
    cache::{CacheStore, MemoryCache},
    meta::{DefaultsProducer, MetaDefaults},
    redirects::{RedirectError, RedirectRouter, RedirectTarget},
    vite::ManifestResolver,
};

/// Programmatic options.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Replaces `meta.defaults` from the config file.
    pub meta_defaults: Option<MetaDefaults>,

    /// Replaces `sitemap.exclude.pages` from the config file.
    pub exclude_pages: Option<Resolvable<Vec<String>>>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("meta_defaults", &self.meta_defaults.is_some())
            .field("exclude_pages", &self.exclude_pages)
            .finish()
    }
}

/// Shared state for metadata resolution and rendering.
pub struct Context {
    config: Config,
    root: PathBuf,
    hooks: Hooks,
    cache: Arc<dyn CacheStore>,
    vite: Arc<ManifestResolver>,
    redirects: RedirectRouter,
    env: OnceLock<Env>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("hooks", &self.hooks)
            .field("vite", &self.vite)
            .field("redirects", &self.redirects.len())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Start building a context for the project at `root`.
    pub fn builder(config: Config, root: impl Into<PathBuf>) -> ContextBuilder {
        ContextBuilder {
            config,
            root: root.into(),
            hooks: Hooks::default(),
            cache: None,
            vite: None,
            redirects: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    pub fn vite(&self) -> &ManifestResolver {
        &self.vite
    }

    pub fn redirects(&self) -> &RedirectRouter {
        &self.redirects
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    /// Environment values, loaded on first access.
    ///
    /// A missing or unreadable env file yields an empty repository, so only
    /// process variables are visible.
    pub fn env(&self) -> &Env {
        self.env.get_or_init(|| {
            let dir = self
                .config
                .env
                .path
                .as_ref()
                .map_or_else(|| self.root.clone(), |path| self.root.join(path));

            match Env::load(&dir, &self.config.env.filename) {
                Ok(env) => env,
                Err(e) => {
                    debug!(error = %e, "no environment file, using process variables only");
                    Env::default()
                }
            }
        })
    }
}

/// Builder for [`Context`].
pub struct ContextBuilder {
    config: Config,
    root: PathBuf,
    hooks: Hooks,
    cache: Option<Arc<dyn CacheStore>>,
    vite: Option<ManifestResolver>,
    redirects: Vec<(String, RedirectTarget)>,
}

impl ContextBuilder {
    /// Compute default metadata per page instead of reading `meta.defaults`.
    #[must_use]
    pub fn meta_defaults<F>(mut self, producer: F) -> Self
    where
        F: Fn(&Site, &Page) -> MetadataMap + Send + Sync + 'static,
    {
        let producer: DefaultsProducer = Arc::new(producer);
        self.hooks.meta_defaults = Some(MetaDefaults::Producer(producer));
        self
    }

    /// Use a fixed metadata map as defaults.
    #[must_use]
    pub fn meta_defaults_map(mut self, map: MetadataMap) -> Self {
        self.hooks.meta_defaults = Some(MetaDefaults::Literal(map));
        self
    }

    /// Page id patterns excluded from the sitemap, literal or produced.
    #[must_use]
    pub fn exclude_pages(mut self, patterns: impl Into<Resolvable<Vec<String>>>) -> Self {
        self.hooks.exclude_pages = Some(patterns.into());
        self
    }

    /// Add a redirect rule after the configured ones.
    #[must_use]
    pub fn redirect(mut self, from: impl Into<String>, to: impl Into<RedirectTarget>) -> Self {
        self.redirects.push((from.into(), to.into()));
        self
    }

    /// Use a custom cache store.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a preloaded manifest resolver instead of reading it from disk.
    #[must_use]
    pub fn vite(mut self, vite: ManifestResolver) -> Self {
        self.vite = Some(vite);
        self
    }

    /// Load the manifest and compile redirect patterns.
    pub fn build(self) -> Result<Context, RedirectError> {
        let mut redirects = RedirectRouter::from_config(&self.config)?;
        for (from, to) in self.redirects {
            redirects.add(&from, to)?;
        }

        let vite = self
            .vite
            .unwrap_or_else(|| ManifestResolver::load(&self.root, &self.config));
        if vite.is_dev() {
            warn!("no Vite manifest found, resolving assets against the dev server");
        }

        Ok(Context {
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(MemoryCache::new())),
            vite: Arc::new(vite),
            redirects,
            config: self.config,
            root: self.root,
            hooks: self.hooks,
            env: OnceLock::new(),
        })
    }
}
