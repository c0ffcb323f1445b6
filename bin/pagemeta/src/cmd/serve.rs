//! Serve command - host robots.txt, the sitemap and redirects

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;

use super::load_project;
use crate::server::{ServerState, create_router};

/// Run the serve command.
///
/// Content is loaded once at startup.
pub async fn run(
    config_path: &Path,
    content: Option<&Path>,
    host: &str,
    port: u16,
    entries: Vec<String>,
) -> Result<()> {
    tracing::info!(?config_path, host, port, "Starting server");

    let (ctx, site) = load_project(config_path, content)?;
    if ctx.vite().is_dev() {
        tracing::info!("No Vite manifest found, assets point at the dev server");
    }

    let pages = site.index().len();
    let app = create_router(ServerState::new(ctx, site, entries));

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Serving {pages} pages at http://{addr}");
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}
