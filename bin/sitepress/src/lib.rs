//! Sitepress CLI Library
//!
//! Command implementations and the preview server behind the `sitepress`
//! binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, routes, serve)
//! - [`server`] - Preview server for the exported site
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use sitepress::cmd::{self, Overrides};
//!
//! # async fn run() -> color_eyre::eyre::Result<()> {
//! // Prerender the project in the current directory
//! cmd::build::run(Path::new("."), false, &Overrides::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod cmd;
pub mod server;

// Re-export core types for convenience
pub use sitepress_core::{Config, Route};
pub use sitepress_generator::{BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
///
/// # Example
///
/// ```no_run
/// sitepress::init_tracing(2); // Enable DEBUG level logging
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
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
