//! Check command - validate configuration and content

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use pagemeta_core::{Config, Site};
use pagemeta_generator::{Context, ManifestResolver, PageMeta, RedirectRouter, SiteLoader, SitemapBuilder};

use super::project_root;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates configuration, content, sitemap patterns, redirect rules and
/// the Vite manifest.
pub fn run(config_path: &Path, content: Option<&Path>, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let result = validate(config_path, content);

    // Print summary
    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    // Determine exit status
    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

fn validate(config_path: &Path, content: Option<&Path>) -> ValidationResult {
    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = match Config::load_with_env(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            c
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
            return result;
        }
    };
    check_config_values(&config, &mut result);

    let root = project_root(config_path);

    println!("\nChecking redirects...");
    let redirects_ok = check_redirects(&config, &mut result);

    println!("\nChecking assets...");
    check_assets(&root, &config, &mut result);

    println!("\nChecking content...");
    let content_dir = content.map_or_else(|| root.join("content"), Path::to_path_buf);
    let site = match SiteLoader::new(&config, &content_dir).load() {
        Ok(site) => {
            println!("  ✓ {} pages loaded", site.index().len());
            site
        }
        Err(e) => {
            result.add_error(format!("Content error: {e}"));
            println!("  ✗ Content could not be loaded: {e}");
            return result;
        }
    };
    check_special_pages(&site, &mut result);

    if !redirects_ok {
        result.add_warning("Metadata and sitemap checks skipped because redirects are invalid");
        return result;
    }

    match Context::builder(config, root).build() {
        Ok(ctx) => {
            println!("\nChecking metadata...");
            check_metadata(&ctx, &site, &mut result);

            println!("\nChecking sitemap...");
            check_sitemap(&ctx, &site, &mut result);
        }
        Err(e) => result.add_error(format!("Context error: {e}")),
    }

    result
}

fn check_config_values(config: &Config, result: &mut ValidationResult) {
    let languages = &config.site.languages;
    if languages.len() > 1 && languages.iter().filter(|l| l.default).count() != 1 {
        result.add_warning("No single default language set; the first language is used");
    }

    for code in config.meta.twitter.languages.keys() {
        if !languages.iter().any(|l| &l.code == code) {
            result.add_warning(format!(
                "Twitter handles configured for unknown language '{code}'"
            ));
        }
    }

    if config.robots.enable && !config.sitemap.enable {
        result.add_warning("robots.txt references sitemap.xml, but the sitemap is disabled");
    }
}

fn check_redirects(config: &Config, result: &mut ValidationResult) -> bool {
    match RedirectRouter::from_config(config) {
        Ok(router) => {
            println!("  ✓ {} redirect rule(s) compiled", router.len());
            true
        }
        Err(e) => {
            result.add_error(format!("Redirect error: {e}"));
            println!("  ✗ {e}");
            false
        }
    }
}

fn check_assets(root: &Path, config: &Config, result: &mut ValidationResult) {
    let vite = ManifestResolver::load(root, config);
    if vite.is_dev() {
        let path = ManifestResolver::manifest_path(root, &config.vite.out_dir);
        result.add_warning(format!(
            "No Vite manifest at {}; assets resolve to the dev server",
            path.display()
        ));
        println!("  ⚠ Dev mode");
    } else {
        println!("  ✓ Production manifest loaded");
    }
}

fn check_special_pages(site: &Site, result: &mut ValidationResult) {
    if site.home().is_none() {
        result.add_warning(format!("Home page '{}' not found", site.home_page));
    }
    if site.error_page().is_none() {
        result.add_warning(format!("Error page '{}' not found", site.error_page));
    }
}

fn check_metadata(ctx: &Context, site: &Site, result: &mut ValidationResult) {
    let mut failed = 0;
    for page in site.index() {
        let rendered = PageMeta::new(ctx, site, page).and_then(|meta| meta.head());
        if let Err(e) = rendered {
            failed += 1;
            result.add_error(format!("{}: {e}", page.id));
        }
    }

    if failed == 0 {
        println!("  ✓ Head tags render for every page");
    } else {
        println!("  ✗ {failed} page(s) failed");
    }
}

fn check_sitemap(ctx: &Context, site: &Site, result: &mut ValidationResult) {
    if !ctx.config().sitemap.enable {
        println!("  - Sitemap disabled");
        return;
    }

    match SitemapBuilder::new(ctx).urls(site) {
        Ok(urls) => println!("  ✓ {} URL(s) in sitemap", urls.len()),
        Err(e) => {
            result.add_error(format!("Sitemap error: {e}"));
            println!("  ✗ {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(config: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        std::fs::create_dir_all(dir.path().join("content/home")).unwrap();
        std::fs::write(dir.path().join("content/home/home.md"), "---\ntitle: Home\n---\n").unwrap();
        dir
    }

    #[test]
    fn test_validation_result() {
        let mut result = ValidationResult::default();
        assert!(!result.has_errors());
        assert!(!result.has_warnings());

        result.add_error("Test error");
        result.add_warning("Test warning");

        assert!(result.has_errors());
        assert!(result.has_warnings());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate(&dir.path().join("config.toml"), None);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Configuration error"));
    }

    #[test]
    fn test_valid_project_warns_only() {
        let dir = project("[site]\nurl = \"https://example.com\"\n\n[sitemap]\nenable = true\n");
        let result = validate(&dir.path().join("config.toml"), None);

        assert!(!result.has_errors(), "{:?}", result.errors);
        // No manifest and no error page
        assert_eq!(result.warnings.len(), 2);

        assert!(run(&dir.path().join("config.toml"), None, false).is_ok());
        assert!(run(&dir.path().join("config.toml"), None, true).is_err());
    }

    #[test]
    fn test_invalid_sitemap_pattern() {
        let dir = project(
            "[site]\nurl = \"https://example.com\"\n\n[sitemap]\nenable = true\n\n[sitemap.exclude]\npages = [\"blog/(\"]\n",
        );
        let result = validate(&dir.path().join("config.toml"), None);
        assert!(result.errors.iter().any(|e| e.starts_with("Sitemap error")));
    }

    #[test]
    fn test_invalid_redirect_pattern() {
        let dir = project(
            "[site]\nurl = \"https://example.com\"\n\n[[redirects]]\nfrom = \"old/(\"\nto = \"new\"\n",
        );
        let result = validate(&dir.path().join("config.toml"), None);
        assert!(result.errors.iter().any(|e| e.starts_with("Redirect error")));
    }

    #[test]
    fn test_unknown_twitter_language() {
        let dir = project(
            "[site]\nurl = \"https://example.com\"\n\n[meta.twitter.languages.fr]\nsite = \"@fr\"\n",
        );
        let result = validate(&dir.path().join("config.toml"), None);
        assert!(result.warnings.iter().any(|w| w.contains("unknown language 'fr'")));
    }
}
