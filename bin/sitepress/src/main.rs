//! Sitepress CLI
//!
//! Prerenders every route of a single-page application to static HTML.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use sitepress::cmd::{self, Overrides};

/// Command-line interface for sitepress.
#[derive(Parser)]
#[command(
    name = "sitepress",
    version,
    about = "Prerender a single-page application to a static site"
)]
struct Cli {
    /// Project root containing static.config.toml
    #[arg(short = 'C', long, default_value = ".")]
    root: PathBuf,

    /// Let SITEPRESS__* environment variables override the config file
    #[arg(long)]
    env: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Render every route to the output directory
    Build {
        /// Output directory, relative to the project root
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the site root (e.g., https://example.com)
        #[arg(long)]
        site_root: Option<String>,
    },
    /// Print the normalized routes as JSON
    Routes,
    /// Build, then serve the output on a free local port
    Serve {
        /// First port to try
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Output directory, relative to the project root
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    sitepress::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { output, site_root } => {
            let overrides = Overrides {
                out_dir: output.as_deref(),
                site_root: site_root.as_deref(),
            };
            cmd::build::run(&cli.root, cli.env, &overrides).await?;
        }
        Commands::Routes => {
            cmd::routes::run(&cli.root, cli.env).await?;
        }
        Commands::Serve { port, output } => {
            let overrides = Overrides {
                out_dir: output.as_deref(),
                site_root: None,
            };
            cmd::serve::run(&cli.root, cli.env, &overrides, port).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["sitepress", "build", "--output", "out"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.verbose, 0);
        assert!(!cli.env);

        match cli.command {
            Commands::Build { output, site_root } => {
                assert_eq!(output, Some(PathBuf::from("out")));
                assert!(site_root.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_with_site_root() {
        let args = ["sitepress", "build", "--site-root", "https://example.com"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Build { site_root, .. } => {
                assert_eq!(site_root.as_deref(), Some("https://example.com"));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_serve_command_parsing() {
        let cli = Cli::parse_from(["sitepress", "serve", "--port", "8080"]);

        match cli.command {
            Commands::Serve { port, output } => {
                assert_eq!(port, 8080);
                assert!(output.is_none());
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_serve_default_port() {
        let cli = Cli::parse_from(["sitepress", "serve"]);
        assert!(matches!(cli.command, Commands::Serve { port: 3000, .. }));
    }

    #[test]
    fn test_cli_routes_command_parsing() {
        let cli = Cli::parse_from(["sitepress", "-C", "site", "--env", "routes"]);
        assert!(matches!(cli.command, Commands::Routes));
        assert_eq!(cli.root, PathBuf::from("site"));
        assert!(cli.env);
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let cli = Cli::parse_from(["sitepress", "-vvv", "build"]);
        assert_eq!(cli.verbose, 3);
    }
}
