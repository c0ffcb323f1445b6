//! pagemeta CLI
//!
//! SEO head tags, XML sitemap and robots.txt for directory-based content sites.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for pagemeta.
#[derive(Parser)]
#[command(
    name = "pagemeta",
    version,
    about = "SEO metadata, sitemap and robots.txt for content sites"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: std::path::PathBuf,

    /// Content directory (defaults to `content/` next to the config file)
    #[arg(long)]
    content: Option<std::path::PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Serve robots.txt, the sitemap, page head previews and redirects
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Vite entry to include in page previews (repeatable)
        #[arg(short, long = "entry")]
        entries: Vec<String>,
    },
    /// Print the XML sitemap or write it to a file
    Sitemap {
        /// Output file
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Print all head tags of a page
    Head {
        /// Page id (e.g., blog/hello-world)
        page: String,
        /// Language code
        #[arg(short, long)]
        lang: Option<String>,
    },
    /// Validate configuration, content, patterns and assets
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    pagemeta::init_tracing(cli.verbose);

    let content = cli.content.as_deref();
    match cli.command {
        Commands::Serve {
            port,
            host,
            entries,
        } => {
            pagemeta::cmd::serve::run(&cli.config, content, &host, port, entries).await?;
        }
        Commands::Sitemap { output } => {
            pagemeta::cmd::sitemap::run(&cli.config, content, output.as_deref())?;
        }
        Commands::Head { page, lang } => {
            pagemeta::cmd::head::run(&cli.config, content, &page, lang.as_deref())?;
        }
        Commands::Check { strict } => {
            pagemeta::cmd::check::run(&cli.config, content, strict)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_serve_command_parsing() {
        let args = [
            "pagemeta",
            "serve",
            "--port",
            "8080",
            "--entry",
            "src/main.ts",
            "-e",
            "src/admin.ts",
        ];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, std::path::PathBuf::from("config.toml"));
        assert!(cli.content.is_none());
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Serve {
                port,
                host,
                entries,
            } => {
                assert_eq!(port, 8080);
                assert_eq!(host, "127.0.0.1");
                assert_eq!(entries, ["src/main.ts", "src/admin.ts"]);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_sitemap_command_parsing() {
        let args = ["pagemeta", "sitemap", "--output", "public/sitemap.xml"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Sitemap { output } => {
                assert_eq!(output, Some(std::path::PathBuf::from("public/sitemap.xml")));
            }
            _ => panic!("Expected Sitemap command"),
        }
    }

    #[test]
    fn test_cli_head_command_parsing() {
        let args = ["pagemeta", "head", "blog/hello-world", "--lang", "de"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Head { page, lang } => {
                assert_eq!(page, "blog/hello-world");
                assert_eq!(lang.as_deref(), Some("de"));
            }
            _ => panic!("Expected Head command"),
        }
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let args = ["pagemeta", "check", "--strict"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Check { strict } => {
                assert!(strict);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let args = ["pagemeta", "-vvv", "check"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_paths() {
        let args = [
            "pagemeta",
            "--config",
            "site/config.toml",
            "--content",
            "site/pages",
            "sitemap",
        ];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.config, std::path::PathBuf::from("site/config.toml"));
        assert_eq!(cli.content, Some(std::path::PathBuf::from("site/pages")));
    }
}
