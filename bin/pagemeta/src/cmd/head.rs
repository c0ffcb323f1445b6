//! Head command - print the head tags of a page

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};
use pagemeta_generator::PageMeta;

use super::load_project;

/// Run the head command.
pub fn run(
    config_path: &Path,
    content: Option<&Path>,
    page_id: &str,
    lang: Option<&str>,
) -> Result<()> {
    let (ctx, site) = load_project(config_path, content)?;

    let page = site
        .find(page_id)
        .ok_or_else(|| eyre!("Page not found: {page_id}"))?;

    if let Some(code) = lang
        && site.language(code).is_none()
    {
        tracing::warn!(lang = code, "Unknown language, using the default");
    }

    let meta = PageMeta::new(&ctx, &site, page).wrap_err("Failed to resolve metadata")?;
    let meta = match lang {
        Some(code) => meta.with_language(code),
        None => meta,
    };

    print!("{}", meta.head().wrap_err("Failed to render head tags")?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[site]\nurl = \"https://example.com\"\n",
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("content")).unwrap();

        let err = run(&dir.path().join("config.toml"), None, "missing", None).unwrap_err();
        assert!(err.to_string().contains("Page not found: missing"));
    }
}
