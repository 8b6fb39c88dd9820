//! Route export.
//!
//! Renders every normalized route to `index.html` plus `routeData.json`.
//! Routes are rendered concurrently; the export fails on the first route
//! that fails.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures_util::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use sitepress_core::{Config, CoreError, FetchContext, Route, route::last_declared};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    document::{DocumentBuilder, DocumentError, PageParts},
    head::HeadTags,
    render::{AppContext, NoHooks, RenderError, RenderHooks, RenderOutput, Renderer},
};

/// File name of the per-route data artifact.
pub const ROUTE_DATA_FILE: &str = "routeData.json";

/// Post-render metadata key whose fields replace the rendered head tags.
pub const HEAD_META_KEY: &str = "head";

/// File name of the not-found page at the output root.
pub const NOT_FOUND_FILE: &str = "404.html";

/// Route export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Route data could not be fetched.
    #[error("data error for route {route}: {source}")]
    Data {
        route: String,
        #[source]
        source: CoreError,
    },

    /// Rendering failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Document assembly failed.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing an artifact failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Contents of `routeData.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_props: Option<&'a Value>,
}

/// Renders routes and writes their artifacts.
#[derive(Debug, Clone)]
pub struct RouteExporter {
    renderer: Arc<dyn Renderer>,
    hooks: Arc<dyn RenderHooks>,
    document: DocumentBuilder,
    entry: String,
    out_dir: PathBuf,
    dev: bool,
}

impl RouteExporter {
    /// Create an exporter for the configured project.
    #[must_use]
    pub fn new(config: &Config, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer,
            hooks: Arc::new(NoHooks),
            document: DocumentBuilder::new(config.document.as_deref(), config.site_root.as_deref()),
            entry: config.entry.clone(),
            out_dir: config.out_dir.clone(),
            dev: false,
        }
    }

    /// Set the render hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn RenderHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Pass the development flag to data sources.
    #[must_use]
    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// Render every route. Returns the number of routes written.
    ///
    /// When several routes share a path only the last declaration is built.
    pub async fn export_all(&self, routes: &[Route], site_props: &Value) -> Result<usize> {
        let unique = last_declared(routes);
        if unique.len() < routes.len() {
            warn!(
                skipped = routes.len() - unique.len(),
                "duplicate route paths, building the last declaration of each"
            );
        }

        info!(count = unique.len(), "rendering routes");

        let written = try_join_all(
            unique
                .into_iter()
                .map(|route| self.export_route(route, site_props)),
        )
        .await?;

        Ok(written.len())
    }

    /// Render a single route and write its HTML and data files.
    pub async fn export_route(&self, route: &Route, site_props: &Value) -> Result<()> {
        let initial_props = match &route.get_props {
            Some(source) => Some(
                source
                    .fetch(FetchContext::route(route, self.dev))
                    .await
                    .map_err(|source| ExportError::Data {
                        route: route.path.clone(),
                        source,
                    })?,
            ),
            None => None,
        };

        let app = AppContext {
            entry: &self.entry,
            url: &route.path,
            initial_props: initial_props.as_ref(),
            site_props,
        };

        let mut meta = self.hooks.pre_render(&app).await?;
        let RenderOutput { markup, mut head } = self.renderer.render(&app).await?;
        let mut post = self.hooks.post_render(&markup).await?;
        if let Some(overrides) = post.remove(HEAD_META_KEY) {
            head = merge_head(&head, overrides)?;
        }
        meta.extend(post);

        let html = self.document.assemble(&PageParts {
            path: &route.path,
            initial_props: initial_props.as_ref(),
            site_props,
            markup: &markup,
            head: &head,
            meta: &meta,
        })?;

        let data = serde_json::to_string(&RouteData {
            initial_props: initial_props.as_ref(),
        })?;

        let html_path = html_path(&self.out_dir, route);
        let data_path = data_path(&self.out_dir, route);
        tokio::try_join!(write_file(&html_path, html), write_file(&data_path, data))?;

        debug!(route = %route.path, path = %html_path.display(), "wrote route");
        Ok(())
    }
}

/// Replace head tag groups with the fields of a post-render `head` object.
fn merge_head(head: &HeadTags, overrides: Value) -> serde_json::Result<HeadTags> {
    let fields: Map<String, Value> = serde_json::from_value(overrides)?;
    let mut merged: Map<String, Value> = serde_json::from_value(serde_json::to_value(head)?)?;
    merged.extend(fields);
    serde_json::from_value(Value::Object(merged))
}

/// Output directory of a route.
fn route_dir(out_dir: &Path, route: &Route) -> PathBuf {
    out_dir.join(route.path.trim_start_matches('/'))
}

/// Where the HTML of a route is written.
#[must_use]
pub fn html_path(out_dir: &Path, route: &Route) -> PathBuf {
    if route.is_404 {
        out_dir.join(NOT_FOUND_FILE)
    } else {
        route_dir(out_dir, route).join("index.html")
    }
}

/// Where the data file of a route is written.
#[must_use]
pub fn data_path(out_dir: &Path, route: &Route) -> PathBuf {
    route_dir(out_dir, route).join(ROUTE_DATA_FILE)
}

async fn write_file(path: &Path, contents: String) -> Result<()> {
    let write = async {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await
    };

    write.await.map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
