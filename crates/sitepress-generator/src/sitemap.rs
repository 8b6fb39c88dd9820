//! Sitemap generation.
//!
//! Generates XML sitemaps for search engine optimization.

use std::path::{Path, PathBuf};

use sitepress_core::{Config, Route, route::last_declared};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name of the sitemap at the output root.
pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Priority of routes that do not declare one.
pub const DEFAULT_PRIORITY: f32 = 0.5;

/// Sitemap generation errors.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sitemap operations.
pub type Result<T> = std::result::Result<T, SitemapError>;

/// A sitemap URL entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    /// URL location, ending in exactly one slash.
    pub loc: String,

    /// Last modification value, verbatim.
    pub lastmod: Option<String>,

    /// Priority (0.0 to 1.0).
    pub priority: Option<f32>,
}

/// Sitemap generator.
#[derive(Debug, Clone)]
pub struct SitemapGenerator {
    site_root: String,
}

impl SitemapGenerator {
    /// Create a generator for an absolute site root.
    #[must_use]
    pub fn new(site_root: impl Into<String>) -> Self {
        Self {
            site_root: site_root.into(),
        }
    }

    /// Create a generator for the project, if it has a site root.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        config.site_root.as_deref().map(Self::new)
    }

    /// Sitemap entries for the indexable, non-404 routes.
    ///
    /// A path declared more than once is listed once, as last declared.
    #[must_use]
    pub fn urls(&self, routes: &[Route]) -> Vec<SitemapUrl> {
        last_declared(routes)
            .into_iter()
            .filter(|route| !route.is_404 && !route.noindex)
            .map(|route| SitemapUrl {
                loc: normalize_loc(&format!("{}{}", self.site_root, route.path)),
                lastmod: route.last_modified.clone().filter(|s| !s.is_empty()),
                priority: Some(route.priority.unwrap_or(DEFAULT_PRIORITY)),
            })
            .collect()
    }

    /// Generate sitemap XML from routes.
    #[must_use]
    pub fn generate(&self, routes: &[Route]) -> String {
        let urls = self.urls(routes);
        debug!(count = urls.len(), "generating sitemap");

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for url in &urls {
            xml.push_str(&url_to_xml(url));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Write `sitemap.xml` into the output directory.
    pub async fn write(&self, routes: &[Route], out_dir: &Path) -> Result<PathBuf> {
        let path = out_dir.join(SITEMAP_FILE);
        tokio::fs::create_dir_all(out_dir).await?;
        tokio::fs::write(&path, self.generate(routes)).await?;

        info!(path = %path.display(), "generated sitemap");
        Ok(path)
    }
}

/// Write the sitemap for the project, or warn and skip without a site root.
///
/// Returns the written path.
pub async fn write_sitemap(config: &Config, routes: &[Route]) -> Result<Option<PathBuf>> {
    match SitemapGenerator::from_config(config) {
        Some(generator) => generator.write(routes, &config.out_dir).await.map(Some),
        None => {
            warn!(
                "no `site_root` configured; it is required for absolute URLs and sitemap.xml, skipping sitemap"
            );
            Ok(None)
        }
    }
}

/// Collapse trailing slashes into exactly one.
fn normalize_loc(permalink: &str) -> String {
    format!("{}/", permalink.trim_end_matches('/'))
}

/// Convert a URL entry to XML.
fn url_to_xml(url: &SitemapUrl) -> String {
    let mut xml = String::from("  <url>\n");

    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));

    if let Some(lastmod) = &url.lastmod {
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(lastmod)));
    }

    if let Some(priority) = url.priority.filter(|p| *p > 0.0) {
        xml.push_str(&format!("    <priority>{priority}</priority>\n"));
    }

    xml.push_str("  </url>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use sitepress_core::{RouteDecl, normalize_routes};
    use tempfile::TempDir;

    use super::*;

    fn routes() -> Vec<Route> {
        let mut decl_blog = RouteDecl::new("blog");
        decl_blog.priority = Some(0.8);
        decl_blog.last_modified = Some("2024-01-15".to_string());

        normalize_routes(vec![
            RouteDecl::new("/"),
            decl_blog.child(RouteDecl::new("a&b")),
            RouteDecl::new("private")
                .noindex(true)
                .child(RouteDecl::new("hidden")),
        ])
        .unwrap()
    }

    #[test]
    fn test_urls_skip_noindex_and_not_found() {
        let urls = SitemapGenerator::new("https://x.com").urls(&routes());
        let locs: Vec<_> = urls.iter().map(|u| u.loc.as_str()).collect();

        assert_eq!(
            locs,
            vec!["https://x.com/", "https://x.com/blog/", "https://x.com/blog/a&b/"]
        );
    }

    #[test]
    fn test_url_defaults() {
        let urls = SitemapGenerator::new("https://x.com").urls(&routes());

        assert_eq!(urls[0].priority, Some(DEFAULT_PRIORITY));
        assert!(urls[0].lastmod.is_none());
        assert_eq!(urls[1].priority, Some(0.8));
        assert_eq!(urls[1].lastmod.as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_generate_xml() {
        let xml = SitemapGenerator::new("https://x.com").generate(&routes());

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://x.com/</loc>"));
        assert!(xml.contains("<loc>https://x.com/blog/a&amp;b/</loc>"));
        assert!(xml.contains("<lastmod>2024-01-15</lastmod>"));
        assert!(xml.contains("<priority>0.5</priority>"));
        assert!(xml.contains("<priority>0.8</priority>"));
        assert!(!xml.contains("private"));
        assert!(!xml.contains("404"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn test_duplicate_path_listed_once() {
        let mut first = RouteDecl::new("about");
        first.priority = Some(0.1);
        let mut second = RouteDecl::new("about");
        second.priority = Some(0.9);

        let routes = normalize_routes(vec![first, second]).unwrap();
        let urls = SitemapGenerator::new("https://x.com").urls(&routes);

        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].loc, "https://x.com/about/");
        assert_eq!(urls[0].priority, Some(0.9));
    }

    #[test]
    fn test_normalize_loc() {
        assert_eq!(normalize_loc("https://x.com"), "https://x.com/");
        assert_eq!(normalize_loc("https://x.com/a///"), "https://x.com/a/");
    }

    #[test]
    fn test_zero_priority_omitted() {
        let url = SitemapUrl {
            loc: "https://x.com/".to_string(),
            lastmod: None,
            priority: Some(0.0),
        };
        assert!(!url_to_xml(&url).contains("priority"));
    }

    #[tokio::test]
    async fn test_write_sitemap() {
        let out = TempDir::new().unwrap();
        let config = Config::new(out.path())
            .with_out_dir(out.path())
            .with_site_root(Some("https://x.com/"));

        let path = write_sitemap(&config, &routes()).await.unwrap();
        assert_eq!(path, Some(out.path().join(SITEMAP_FILE)));

        let xml = std::fs::read_to_string(out.path().join(SITEMAP_FILE)).unwrap();
        assert!(xml.contains("<loc>https://x.com/blog/</loc>"));
    }

    #[tokio::test]
    async fn test_no_site_root_skips() {
        let out = TempDir::new().unwrap();
        let config = Config::new(out.path()).with_out_dir(out.path());

        let path = write_sitemap(&config, &routes()).await.unwrap();
        assert!(path.is_none());
        assert!(!out.path().join(SITEMAP_FILE).exists());
    }
}
