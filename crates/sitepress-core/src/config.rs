//! Project configuration management.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    data::{DataSource, DeclaredRoutes, FetchContext, InlineData, JsonFile, RouteSource},
    error::{CoreError, Result},
    route::{Route, RouteDecl, normalize_routes},
};

/// Configuration file name, looked up in the project root.
pub const CONFIG_FILE: &str = "static.config.toml";

/// Application entry used when none is configured.
pub const DEFAULT_ENTRY: &str = "src/index";

/// HTML entry template inside the public directory.
pub const ENTRY_TEMPLATE: &str = "index.html";

/// On-disk shape of `static.config.toml`.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    site_root: Option<String>,

    #[serde(default = "default_entry")]
    entry: String,

    #[serde(default = "default_out_dir")]
    out_dir: PathBuf,

    #[serde(default = "default_public_dir")]
    public_dir: PathBuf,

    #[serde(default)]
    document: Option<PathBuf>,

    #[serde(default)]
    renderer: RendererConfig,

    #[serde(default)]
    site_props: Option<Value>,

    #[serde(default)]
    site_props_file: Option<PathBuf>,

    #[serde(default)]
    routes: Vec<RouteDecl>,
}

/// External rendering engine invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Program to run once per route.
    #[serde(default)]
    pub command: Option<String>,

    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for the program.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

// Default value functions
fn default_entry() -> String {
    DEFAULT_ENTRY.to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

/// Loaded build configuration. Immutable for the duration of a build.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root; relative paths in the file resolve against it.
    pub root: PathBuf,

    /// Absolute site URL without trailing slashes.
    pub site_root: Option<String>,

    /// Application entry module handed to the renderer.
    pub entry: String,

    /// Build output directory.
    pub out_dir: PathBuf,

    /// Public assets directory.
    pub public_dir: PathBuf,

    /// Document template override (template text, not a path).
    pub document: Option<String>,

    /// Rendering engine invocation.
    pub renderer: RendererConfig,

    site_props: Arc<dyn DataSource>,
    route_source: Arc<dyn RouteSource>,
}

impl Config {
    /// Configuration with defaults and no routes, rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            out_dir: root.join(default_out_dir()),
            public_dir: root.join(default_public_dir()),
            root,
            site_root: None,
            entry: default_entry(),
            document: None,
            renderer: RendererConfig::default(),
            site_props: Arc::new(InlineData::empty_object()),
            route_source: Arc::new(DeclaredRoutes::default()),
        }
    }

    /// Load `static.config.toml` from the project root.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let file: ConfigFile = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        Self::from_file(root, file)
    }

    /// Load configuration, letting `SITEPRESS__*` environment variables
    /// override file values.
    pub fn load_with_env(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("SITEPRESS").separator("__"))
            .build()?;

        let file: ConfigFile = settings.try_deserialize()?;
        Self::from_file(root, file)
    }

    fn from_file(root: &Path, file: ConfigFile) -> Result<Self> {
        let document = file
            .document
            .map(|doc| {
                let path = root.join(doc);
                std::fs::read_to_string(&path).map_err(|e| {
                    CoreError::config_with_source(
                        format!("Failed to read document template: {}", path.display()),
                        e,
                    )
                })
            })
            .transpose()?;

        let site_props: Arc<dyn DataSource> = match (file.site_props, file.site_props_file) {
            (Some(_), Some(_)) => {
                return Err(CoreError::config(
                    "`site_props` and `site_props_file` cannot both be set",
                ));
            }
            (Some(value), None) => Arc::new(InlineData::new(value)),
            (None, Some(path)) => Arc::new(JsonFile::new(root.join(path))),
            (None, None) => Arc::new(InlineData::empty_object()),
        };

        let mut routes = file.routes;
        for route in &mut routes {
            route.attach_data_sources(root)?;
        }

        if file.entry.trim().is_empty() {
            return Err(CoreError::config("entry cannot be empty"));
        }

        Ok(Self {
            root: root.to_path_buf(),
            site_root: sanitize_site_root(file.site_root.as_deref()),
            entry: file.entry,
            out_dir: root.join(file.out_dir),
            public_dir: root.join(file.public_dir),
            document,
            renderer: file.renderer,
            site_props,
            route_source: Arc::new(DeclaredRoutes::new(routes)),
        })
    }

    /// Replace the route source.
    #[must_use]
    pub fn with_routes(mut self, source: impl RouteSource + 'static) -> Self {
        self.route_source = Arc::new(source);
        self
    }

    /// Replace the site props source.
    #[must_use]
    pub fn with_site_props(mut self, source: impl DataSource + 'static) -> Self {
        self.site_props = Arc::new(source);
        self
    }

    /// Override the site root; the value is sanitized like the file value.
    #[must_use]
    pub fn with_site_root(mut self, site_root: Option<&str>) -> Self {
        self.site_root = sanitize_site_root(site_root);
        self
    }

    /// Override the output directory.
    #[must_use]
    pub fn with_out_dir(mut self, out_dir: impl AsRef<Path>) -> Self {
        self.out_dir = self.root.join(out_dir);
        self
    }

    /// Fetch the route tree and normalize it.
    pub async fn get_routes(&self, dev: bool) -> Result<Vec<Route>> {
        let decls = self.route_source.routes(dev).await?;
        normalize_routes(decls)
    }

    /// Fetch the site-wide props.
    pub async fn site_props(&self, dev: bool) -> Result<Value> {
        self.site_props.fetch(FetchContext::site(dev)).await
    }

    /// HTML entry template excluded from the public copy.
    #[must_use]
    pub fn entry_template(&self) -> PathBuf {
        self.public_dir.join(ENTRY_TEMPLATE)
    }
}

/// Strip trailing slashes; an empty root counts as unset.
#[must_use]
pub fn sanitize_site_root(site_root: Option<&str>) -> Option<String> {
    site_root
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
