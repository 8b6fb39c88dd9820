//! Routes command - prints the normalized route list

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};

use super::{Overrides, load_config};

/// Run the routes command.
pub async fn run(root: &Path, use_env: bool) -> Result<()> {
    println!("{}", render(root, use_env).await?);
    Ok(())
}

/// Normalized routes of the project as pretty JSON.
pub async fn render(root: &Path, use_env: bool) -> Result<String> {
    let config = load_config(root, use_env, &Overrides::default())?;
    let routes = config
        .get_routes(false)
        .await
        .wrap_err("Failed to resolve routes")?;

    serde_json::to_string_pretty(&routes).wrap_err("Failed to encode routes")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn test_routes_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("static.config.toml"),
            r#"
[[routes]]
path = "docs"
noIndex = true
props = { a = 1 }

[[routes.children]]
path = "intro"
"#,
        )
        .unwrap();

        let json = render(dir.path(), false).await.unwrap();
        let routes: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(routes[0]["path"], "/docs");
        assert_eq!(routes[0]["noindex"], true);
        assert_eq!(routes[0]["hasGetProps"], true);
        assert_eq!(routes[1]["path"], "/docs/intro");
        assert_eq!(routes[1]["noindex"], true);
        assert_eq!(routes[2]["path"], "/404");
        assert_eq!(routes[2]["is404"], true);
    }
}
