//! Build orchestration.
//!
//! Coordinates the full site build process.

use std::{io::ErrorKind, path::PathBuf, sync::Arc, time::Instant};

use sitepress_core::{Config, CoreError};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    assets::{AssetCopier, AssetError},
    export::{ExportError, RouteExporter},
    render::{NoHooks, RenderHooks, Renderer},
    route_table::{RouteTableEmitter, RouteTableError},
    sitemap::{SitemapError, write_sitemap},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or route data error.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Route export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Route table error.
    #[error("route table error: {0}")]
    RouteTable(#[from] RouteTableError),

    /// Sitemap generation error.
    #[error("sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// The output directory would take project files with it when cleaned.
    #[error("refusing to clean output directory {out_dir}: it contains {protected}")]
    UnsafeOutDir {
        out_dir: PathBuf,
        protected: PathBuf,
    },

    /// Background task failed.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of routes rendered.
    pub routes: usize,

    /// Number of public assets copied.
    pub assets: usize,

    /// Whether a sitemap was written.
    pub sitemap: bool,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    renderer: Arc<dyn Renderer>,
    hooks: Arc<dyn RenderHooks>,
    dev: bool,
}

impl Builder {
    /// Create a new builder.
    #[must_use]
    pub fn new(config: Config, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            config,
            renderer,
            hooks: Arc::new(NoHooks),
            dev: false,
        }
    }

    /// Set the render hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn RenderHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Build in development mode.
    #[must_use]
    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// The configuration being built.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the full build process.
    pub async fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            root = %self.config.root.display(),
            output = %self.config.out_dir.display(),
            "starting build"
        );

        // 1. Clean output directory
        self.clean_output().await?;

        // 2. Copy public assets
        stats.assets = self.copy_assets().await?;

        // 3. Resolve routes and site data
        let routes = self.config.get_routes(self.dev).await?;
        let site_props = self.config.site_props(self.dev).await?;
        debug!(routes = routes.len(), "resolved routes");

        // 4. Route table
        RouteTableEmitter::from_config(&self.config)
            .write(&routes)
            .await?;

        // 5. Render routes
        stats.routes = RouteExporter::new(&self.config, Arc::clone(&self.renderer))
            .with_hooks(Arc::clone(&self.hooks))
            .with_dev(self.dev)
            .export_all(&routes, &site_props)
            .await?;

        // 6. Sitemap
        stats.sitemap = write_sitemap(&self.config, &routes).await?.is_some();

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            routes = stats.routes,
            assets = stats.assets,
            sitemap = stats.sitemap,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Clean the output directory.
    ///
    /// Fails without removing anything when the output directory is the
    /// project root, the public directory, or an ancestor of either.
    async fn clean_output(&self) -> Result<()> {
        let out_dir = &self.config.out_dir;
        if tokio::fs::try_exists(out_dir).await? {
            let resolved = tokio::fs::canonicalize(out_dir).await?;
            for protected in [&self.config.root, &self.config.public_dir] {
                let protected = match tokio::fs::canonicalize(protected).await {
                    Ok(path) => path,
                    Err(e) if e.kind() == ErrorKind::NotFound => protected.clone(),
                    Err(e) => return Err(e.into()),
                };
                if protected.starts_with(&resolved) {
                    return Err(BuildError::UnsafeOutDir {
                        out_dir: out_dir.clone(),
                        protected,
                    });
                }
            }

            debug!(dir = %out_dir.display(), "cleaning output directory");
            tokio::fs::remove_dir_all(out_dir).await?;
        }
        tokio::fs::create_dir_all(out_dir).await?;
        Ok(())
    }

    async fn copy_assets(&self) -> Result<usize> {
        let copier = AssetCopier::from_config(&self.config);
        let source = self.config.public_dir.clone();
        let dest = self.config.out_dir.clone();

        let count = tokio::task::spawn_blocking(move || copier.copy(&source, &dest)).await??;
        Ok(count)
    }
}
