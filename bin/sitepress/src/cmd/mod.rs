//! Command implementations.

pub mod build;
pub mod routes;
pub mod serve;

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, WrapErr, eyre};
use sitepress_core::Config;
use sitepress_generator::{CommandRenderer, Renderer};

/// Overrides applied on top of `static.config.toml`.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    /// Build output directory, relative to the project root.
    pub out_dir: Option<&'a Path>,

    /// Absolute site URL.
    pub site_root: Option<&'a str>,
}

/// Load the project configuration and apply command-line overrides.
pub fn load_config(root: &Path, use_env: bool, overrides: &Overrides<'_>) -> Result<Config> {
    let mut config = if use_env {
        Config::load_with_env(root)
    } else {
        Config::load(root)
    }
    .wrap_err("Failed to load configuration")?;

    if let Some(out_dir) = overrides.out_dir {
        config = config.with_out_dir(out_dir);
    }

    if let Some(site_root) = overrides.site_root {
        tracing::info!(site_root, "Overriding site root from CLI");
        config = config.with_site_root(Some(site_root));
    }

    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

/// The renderer configured for the project.
pub fn renderer(config: &Config) -> Result<Arc<dyn Renderer>> {
    let renderer = CommandRenderer::from_config(config).ok_or_else(|| {
        eyre!("No renderer configured; set `command` under [renderer] in static.config.toml")
    })?;
    Ok(Arc::new(renderer))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_overrides_applied() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("static.config.toml"),
            "site_root = \"https://a.com\"\n",
        )
        .unwrap();

        let overrides = Overrides {
            out_dir: Some(Path::new("build")),
            site_root: Some("https://b.com/"),
        };
        let config = load_config(dir.path(), false, &overrides).unwrap();

        assert_eq!(config.out_dir, dir.path().join("build"));
        assert_eq!(config.site_root.as_deref(), Some("https://b.com"));
    }

    #[test]
    fn test_missing_renderer() {
        let config = Config::new("/project");
        let err = renderer(&config).unwrap_err();
        assert!(err.to_string().contains("No renderer configured"));
    }
}
