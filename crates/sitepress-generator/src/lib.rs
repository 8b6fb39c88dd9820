//! Sitepress Generator Library
//!
//! Static export engine for sitepress.
//!
//! # Modules
//!
//! - [`render`] - Rendering engine seam and the external command renderer
//! - [`head`] - Head tags reported by the renderer
//! - [`template`] - Document template with variable interpolation
//! - [`document`] - HTML document assembly and hydration data
//! - [`export`] - Concurrent per-route HTML and data export
//! - [`sitemap`] - XML sitemap generation
//! - [`route_table`] - Client route table generation
//! - [`assets`] - Public asset copying
//! - [`port`] - Free port discovery
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod document;
pub mod export;
pub mod head;
pub mod port;
pub mod render;
pub mod route_table;
pub mod sitemap;
pub mod template;

pub use assets::AssetCopier;
pub use build::{BuildError, BuildStats, Builder};
pub use document::{DocumentBuilder, DocumentError};
pub use export::RouteExporter;
pub use head::HeadTags;
pub use port::find_port;
pub use render::{AppContext, CommandRenderer, Meta, NoHooks, RenderHooks, RenderOutput, Renderer};
pub use route_table::RouteTableEmitter;
pub use sitemap::{SitemapGenerator, write_sitemap};
pub use template::{Template, TemplateContext};
