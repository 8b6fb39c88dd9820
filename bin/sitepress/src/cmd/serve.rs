//! Serve command - builds the site and serves the output locally

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use sitepress_generator::{Builder, find_port};
use tokio::net::TcpListener;

use super::{Overrides, load_config, renderer};
use crate::server::create_router;

/// Run the serve command.
///
/// Builds in development mode, then serves the output on the first free
/// port at or above `port`.
pub async fn run(root: &Path, use_env: bool, overrides: &Overrides<'_>, port: u16) -> Result<()> {
    tracing::info!(?root, port, "Starting preview server");

    let config = load_config(root, use_env, overrides)?;
    let output_dir = config.out_dir.clone();
    let renderer = renderer(&config)?;

    tracing::info!("Running initial build...");
    let stats = Builder::new(config, renderer)
        .with_dev(true)
        .build()
        .await
        .wrap_err("Build failed")?;
    tracing::debug!(?stats, "Build completed");

    let port = find_port(port)
        .await
        .wrap_err("Failed to find a free port")?;
    let addr = format!("127.0.0.1:{port}");

    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Rendered {} routes in {}ms", stats.routes, stats.duration_ms);
    println!("  Serving {} at http://{addr}", output_dir.display());
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, create_router(&output_dir))
        .await
        .wrap_err("Server error")?;

    Ok(())
}
