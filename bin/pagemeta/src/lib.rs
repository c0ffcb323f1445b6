//! pagemeta CLI Library
//!
//! This library provides the command implementations and the HTTP server for
//! the pagemeta CLI. It is used by the binary entry point while also
//! exposing public APIs for integration.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (serve, sitemap, head, check)
//! - [`server`] - HTTP host for robots.txt, the sitemap, head previews and redirects
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use pagemeta::cmd;
//!
//! // Print the head tags of a page
//! cmd::head::run(Path::new("config.toml"), None, "blog/hello-world", None).unwrap();
//! ```

pub mod cmd;
pub mod server;

// Re-export core types for convenience
pub use pagemeta_core::{Config, Page, Site};
pub use pagemeta_generator::{Context, PageMeta, SiteLoader, SitemapBuilder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
///
/// # Example
///
/// ```no_run
/// pagemeta::init_tracing(2); // Enable DEBUG level logging
/// ```
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
