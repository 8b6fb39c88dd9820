//! Client route table generation.
//!
//! Emits a JavaScript module whose default export is the router switch the
//! client uses at runtime. Each unique component module gets a sequential
//! identifier, so distinct modules never share an import binding.

use std::{
    fs::FileTimes,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use sitepress_core::{Config, Route, route::last_declared};
use thiserror::Error;
use tracing::{debug, info};

/// File name of the generated route table inside the output directory.
pub const ROUTE_TABLE_FILE: &str = "react-static-routes.js";

/// How far the generated file's timestamps are moved into the past, so file
/// watchers do not treat it as newer than its sources.
pub const BACKDATE: Duration = Duration::from_secs(1000);

/// Route table errors.
#[derive(Debug, Error)]
pub enum RouteTableError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for route table operations.
pub type Result<T> = std::result::Result<T, RouteTableError>;

/// Generates the client route table.
#[derive(Debug, Clone)]
pub struct RouteTableEmitter {
    /// Import prefix from the generated file to the project root.
    import_base: String,
    out_dir: PathBuf,
}

impl RouteTableEmitter {
    /// Create an emitter writing into `out_dir`, importing components
    /// relative to `root`.
    #[must_use]
    pub fn new(root: &Path, out_dir: impl Into<PathBuf>) -> Self {
        let out_dir = out_dir.into();
        let import_base = match pathdiff::diff_paths(root, &out_dir) {
            Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Some(rel) => to_slashes(&rel),
            None => to_slashes(root),
        };

        Self {
            import_base,
            out_dir,
        }
    }

    /// Create an emitter for the project.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.root, &config.out_dir)
    }

    /// Path of the generated file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.out_dir.join(ROUTE_TABLE_FILE)
    }

    /// Generate the module source. Identical routes give identical output.
    ///
    /// A path declared more than once maps to its last declaration.
    #[must_use]
    pub fn generate(&self, routes: &[Route]) -> String {
        let routed: Vec<(&Route, &str)> = last_declared(routes)
            .into_iter()
            .filter_map(|r| r.component.as_deref().map(|c| (r, c)))
            .collect();

        let mut components: Vec<&str> = Vec::new();
        for (_, component) in &routed {
            if !components.contains(component) {
                components.push(*component);
            }
        }

        let ident = |component: &str| {
            let index = components
                .iter()
                .position(|c| *c == component)
                .unwrap_or_default();
            format!("Component{index}")
        };

        let mut src = String::new();
        src.push_str("import React, { Component } from 'react'\n");
        src.push_str("import { Switch, Route } from 'react-router-dom'\n\n");

        for (index, component) in components.iter().enumerate() {
            let module = format!("{}/{}", self.import_base, component.trim_start_matches("./"));
            src.push_str(&format!(
                "import Component{index} from '{}'\n",
                escape_js(&module)
            ));
        }

        src.push_str("\nexport default class Routes extends Component {\n");
        src.push_str("  render () {\n");
        src.push_str("    return (\n");
        src.push_str("      <Switch>\n");

        for (route, component) in routed.iter().filter(|(r, _)| !r.is_404) {
            src.push_str(&format!(
                "        <Route exact path={{'{}'}} component={{{}}} />\n",
                escape_js(&route.path),
                ident(*component)
            ));
        }

        if let Some((_, component)) = routed.iter().find(|(r, _)| r.is_404) {
            src.push_str(&format!(
                "        <Route component={{{}}} />\n",
                ident(*component)
            ));
        }

        src.push_str("      </Switch>\n");
        src.push_str("    )\n");
        src.push_str("  }\n");
        src.push_str("}\n");

        debug!(components = components.len(), "generated route table");
        src
    }

    /// Replace the generated file and back-date its timestamps.
    pub async fn write(&self, routes: &[Route]) -> Result<PathBuf> {
        let path = self.path();
        let source = self.generate(routes);

        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        tokio::fs::create_dir_all(&self.out_dir).await?;
        tokio::fs::write(&path, source).await?;

        let then = SystemTime::now()
            .checked_sub(BACKDATE)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .await?
            .into_std()
            .await;
        file.set_times(FileTimes::new().set_accessed(then).set_modified(then))?;

        info!(path = %path.display(), "wrote route table");
        Ok(path)
    }
}

fn to_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Escape a value for a single-quoted JavaScript string.
fn escape_js(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
