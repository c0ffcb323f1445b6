//! Command implementations.

pub mod check;
pub mod head;
pub mod serve;
pub mod sitemap;

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use pagemeta_core::{Config, Site};
use pagemeta_generator::{Context, SiteLoader};

/// Directory holding the config file; relative paths resolve against it.
pub fn project_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Load configuration, content and context for a project.
///
/// `content` defaults to `content/` next to the config file.
pub fn load_project(config_path: &Path, content: Option<&Path>) -> Result<(Context, Site)> {
    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    let root = project_root(config_path);
    let content_dir = content.map_or_else(|| root.join("content"), Path::to_path_buf);

    let site = SiteLoader::new(&config, &content_dir)
        .load()
        .wrap_err_with(|| format!("Failed to load content from {}", content_dir.display()))?;

    let ctx = Context::builder(config, root)
        .build()
        .wrap_err("Invalid redirect configuration")?;

    Ok((ctx, site))
}
