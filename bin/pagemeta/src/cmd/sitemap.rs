//! Sitemap command - print or write the XML sitemap

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use pagemeta_generator::SitemapBuilder;

use super::load_project;

/// Run the sitemap command.
///
/// Writes to `output` when given, otherwise prints to stdout.
pub fn run(config_path: &Path, content: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let (ctx, site) = load_project(config_path, content)?;

    if !ctx.config().sitemap.enable {
        tracing::warn!("Sitemap is disabled in the configuration");
    }

    let xml = SitemapBuilder::new(&ctx)
        .build(&site)
        .wrap_err("Failed to build sitemap")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, &xml)
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Sitemap written");
        }
        None => print!("{xml}"),
    }

    Ok(())
}
