//! Build command - prerenders the site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use sitepress_generator::{BuildStats, Builder};

use super::{Overrides, load_config, renderer};

/// Run the build command.
///
/// Renders every route into the output directory.
pub async fn run(root: &Path, use_env: bool, overrides: &Overrides<'_>) -> Result<BuildStats> {
    let start = Instant::now();
    tracing::info!(?root, ?overrides, "Starting build");

    let config = load_config(root, use_env, overrides)?;
    let output = config.out_dir.clone();
    let renderer = renderer(&config)?;

    let stats = Builder::new(config, renderer)
        .build()
        .await
        .wrap_err("Build failed")?;

    let duration = start.elapsed();

    // Print build statistics
    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Routes:     {}", stats.routes);
    println!("  Assets:     {}", stats.assets);
    println!(
        "  Sitemap:    {}",
        if stats.sitemap { "written" } else { "skipped" }
    );
    println!();
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", output.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(stats)
}
