//! Application rendering.
//!
//! The UI rendering engine lives outside this crate. A [`Renderer`] turns an
//! [`AppContext`] into markup *and* the head metadata collected during that
//! same render, so no render ever depends on state left behind by another.

use std::{
    collections::BTreeMap,
    fmt,
    path::PathBuf,
    process::{ExitStatus, Stdio},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sitepress_core::Config;
use thiserror::Error;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, trace};

use crate::head::HeadTags;

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer process could not be started.
    #[error("failed to start renderer `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The renderer process exited unsuccessfully.
    #[error("renderer exited with {status} while rendering {url}: {stderr}")]
    Failed {
        url: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The renderer produced output that is not a render result.
    #[error("invalid renderer output for {url}: {source}")]
    Output {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A render hook failed.
    #[error("render hook failed: {0}")]
    Hook(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for rendering.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Metadata collected by render hooks.
pub type Meta = Map<String, Value>;

/// Everything the application sees while one route is rendered.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppContext<'a> {
    /// Application entry module.
    pub entry: &'a str,

    /// Path of the route being rendered.
    #[serde(rename = "URL")]
    pub url: &'a str,

    /// Route props, if the route has a data source.
    pub initial_props: Option<&'a Value>,

    /// Site-wide props.
    pub site_props: &'a Value,
}

/// Result of rendering one route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderOutput {
    /// Application markup, placed inside the root element.
    pub markup: String,

    /// Head metadata gathered during this render.
    #[serde(default)]
    pub head: HeadTags,
}

/// Renders the application for a single route.
#[async_trait]
pub trait Renderer: Send + Sync + fmt::Debug {
    /// Render the application with the given context.
    async fn render(&self, app: &AppContext<'_>) -> Result<RenderOutput>;
}

/// Project hooks around each render.
#[async_trait]
pub trait RenderHooks: Send + Sync + fmt::Debug {
    /// Called before rendering.
    async fn pre_render(&self, _app: &AppContext<'_>) -> Result<Meta> {
        Ok(Meta::new())
    }

    /// Called with the rendered markup. Keys returned here override the
    /// ones returned by [`RenderHooks::pre_render`].
    async fn post_render(&self, _markup: &str) -> Result<Meta> {
        Ok(Meta::new())
    }
}

/// Hooks that collect nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl RenderHooks for NoHooks {}

/// Renders by running an external program once per route.
///
/// The program receives the JSON-encoded [`AppContext`] on stdin and must
/// print a JSON object `{"markup": "...", "head": {...}}` on stdout.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    envs: BTreeMap<String, String>,
    current_dir: PathBuf,
}

impl CommandRenderer {
    /// Create a renderer running `program` from `current_dir`.
    #[must_use]
    pub fn new(program: impl Into<String>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: BTreeMap::new(),
            current_dir: current_dir.into(),
        }
    }

    /// Build the renderer described by the project configuration.
    ///
    /// Returns `None` when no renderer command is configured.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        let program = config.renderer.command.as_deref()?;
        let mut renderer = Self::new(program, &config.root).args(config.renderer.args.clone());
        renderer.envs.extend(config.renderer.env.clone());
        Some(renderer)
    }

    /// Append arguments.
    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the program.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, app: &AppContext<'_>) -> Result<RenderOutput> {
        let request = serde_json::to_vec(app)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(&self.envs)
            .current_dir(&self.current_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        trace!(url = app.url, bytes = request.len(), "sending render request");

        let stdin = child.stdin.take();
        let send = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(&request).await {
                    // The program may exit without reading its input.
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    other => other?,
                }
            }
            Ok::<_, std::io::Error>(())
        };

        let ((), output) = tokio::try_join!(send, child.wait_with_output())?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                url: app.url.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let rendered: RenderOutput =
            serde_json::from_slice(&output.stdout).map_err(|source| RenderError::Output {
                url: app.url.to_string(),
                source,
            })?;

        debug!(url = app.url, bytes = rendered.markup.len(), "rendered route");
        Ok(rendered)
    }
}
