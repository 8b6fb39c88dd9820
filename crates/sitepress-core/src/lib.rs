//! Sitepress Core Library
//!
//! Core types, configuration, data sources and route normalization for the
//! sitepress prerenderer.

pub mod config;
pub mod data;
pub mod error;
pub mod route;

pub use config::{Config, RendererConfig};
pub use data::{DataSource, DeclaredRoutes, FetchContext, InlineData, JsonFile, RouteSource};
pub use error::{CoreError, Result};
pub use route::{NOT_FOUND_PATH, Route, RouteDecl, normalize_routes, path_join};
