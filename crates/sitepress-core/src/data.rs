//! Build-time data sources.
//!
//! Route props, site props and the route tree itself are all produced
//! asynchronously at build time. The traits here are the seams a project
//! plugs its own loaders into; the config file covers the common cases with
//! inline values and JSON files.

use std::{fmt, path::PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{CoreError, Result},
    route::{Route, RouteDecl},
};

/// Context handed to a [`DataSource`] when it is asked for data.
#[derive(Debug, Clone, Copy)]
pub struct FetchContext<'a> {
    /// The route being built, or `None` for site-wide data.
    pub route: Option<&'a Route>,

    /// Whether the fetch happens for a development build.
    pub dev: bool,
}

impl<'a> FetchContext<'a> {
    /// Context for site-wide data.
    #[must_use]
    pub fn site(dev: bool) -> Self {
        Self { route: None, dev }
    }

    /// Context for a single route.
    #[must_use]
    pub fn route(route: &'a Route, dev: bool) -> Self {
        Self {
            route: Some(route),
            dev,
        }
    }
}

/// Produces a JSON value at build time.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Fetch the data for the given context.
    async fn fetch(&self, ctx: FetchContext<'_>) -> Result<Value>;
}

/// Data declared directly in the configuration.
#[derive(Debug, Clone, Default)]
pub struct InlineData(Value);

impl InlineData {
    /// Wrap a value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// An empty JSON object.
    #[must_use]
    pub fn empty_object() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }
}

#[async_trait]
impl DataSource for InlineData {
    async fn fetch(&self, _ctx: FetchContext<'_>) -> Result<Value> {
        Ok(self.0.clone())
    }
}

/// Data read from a JSON file each time it is fetched.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Create a source reading the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for JsonFile {
    async fn fetch(&self, ctx: FetchContext<'_>) -> Result<Value> {
        debug!(
            file = %self.path.display(),
            route = ctx.route.map(|r| r.path.as_str()),
            "reading data file"
        );

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CoreError::data(&self.path, e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| CoreError::data(&self.path, e.to_string()))
    }
}

/// Produces the (unnormalized) route tree.
#[async_trait]
pub trait RouteSource: Send + Sync + fmt::Debug {
    /// Return the declared route tree.
    async fn routes(&self, dev: bool) -> Result<Vec<RouteDecl>>;
}

/// Routes declared in the configuration file.
#[derive(Debug, Clone, Default)]
pub struct DeclaredRoutes(Vec<RouteDecl>);

impl DeclaredRoutes {
    /// Wrap a list of declarations.
    #[must_use]
    pub fn new(routes: Vec<RouteDecl>) -> Self {
        Self(routes)
    }
}

#[async_trait]
impl RouteSource for DeclaredRoutes {
    async fn routes(&self, _dev: bool) -> Result<Vec<RouteDecl>> {
        Ok(self.0.clone())
    }
}
