//! HTML document assembly.
//!
//! Wraps rendered application markup in the document template, injects the
//! hydration data and client bundle, and applies the site root to
//! root-relative links.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    head::HeadTags,
    render::Meta,
    template::{DEFAULT_DOCUMENT, Template, TemplateContext, TemplateError},
};

/// Document assembly errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document template failed.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// The hydration data could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Doctype prepended to every document.
pub const DOCTYPE: &str = "<!DOCTYPE html>";

/// Global the client bootstrap reads hydration data from.
pub const ROUTE_DATA_GLOBAL: &str = "window.__routeData";

/// Client bundle loaded by every page.
pub const CLIENT_BUNDLE: &str = "/app.js";

/// The pieces of one rendered route.
#[derive(Debug, Clone, Copy)]
pub struct PageParts<'a> {
    pub path: &'a str,
    pub initial_props: Option<&'a Value>,
    pub site_props: &'a Value,
    pub markup: &'a str,
    pub head: &'a HeadTags,
    pub meta: &'a Meta,
}

/// Hydration payload embedded in every page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteData<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_props: Option<&'a Value>,
    site_props: &'a Value,
}

/// Builds complete HTML documents from rendered routes.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    template: Template,
    site_root: Option<String>,
}

impl DocumentBuilder {
    /// Create a builder using `template`, or the default document.
    #[must_use]
    pub fn new(template: Option<&str>, site_root: Option<&str>) -> Self {
        Self {
            template: Template::new(template.unwrap_or(DEFAULT_DOCUMENT)),
            site_root: site_root.map(str::to_string),
        }
    }

    /// Assemble the full document for a route, doctype included.
    pub fn assemble(&self, page: &PageParts<'_>) -> Result<String> {
        let mut ctx = TemplateContext::new()
            .with_var("html_attrs", page.head.html_attrs())
            .with_var("head", page.head.head_html())
            .with_var("body_attrs", page.head.body_attrs())
            .with_var("body", body_html(page)?);

        if let Some(site) = page.site_props.as_object() {
            ctx.insert_object("site", site);
        }
        ctx.insert_object("meta", page.meta);

        let mut html = format!("{DOCTYPE}{}", self.template.render(&ctx)?);

        if let Some(site_root) = &self.site_root {
            html = rewrite_hrefs(&html, site_root);
        }

        Ok(html)
    }
}

fn body_html(page: &PageParts<'_>) -> serde_json::Result<String> {
    let data = RouteData {
        path: page.path,
        initial_props: page.initial_props,
        site_props: page.site_props,
    };

    Ok(format!(
        r#"<div id="root">{markup}</div><script type="text/javascript">{ROUTE_DATA_GLOBAL} = {data}</script><script async src="{CLIENT_BUNDLE}"></script>"#,
        markup = page.markup,
        data = script_json(&data)?,
    ))
}

/// Serialize a value for embedding inside a `<script>` element.
fn script_json(value: &impl Serialize) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?
        .replace("</", r"<\/")
        .replace('\u{2028}', r"\u2028")
        .replace('\u{2029}', r"\u2029"))
}

fn href_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(href=["'])(/[^/])"#).expect("valid href pattern"))
}

/// Prefix root-relative `href` values with the site root.
///
/// Only values with a non-slash character after the leading slash are
/// rewritten, so `href="/"` and protocol-relative `href="//cdn"` are left
/// alone.
#[must_use]
pub fn rewrite_hrefs(html: &str, site_root: &str) -> String {
    href_pattern()
        .replace_all(html, |caps: &Captures<'_>| {
            format!("{}{site_root}{}", &caps[1], &caps[2])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parts<'a>(
        head: &'a HeadTags,
        meta: &'a Meta,
        site: &'a Value,
        props: Option<&'a Value>,
    ) -> PageParts<'a> {
        PageParts {
            path: "/about",
            initial_props: props,
            site_props: site,
            markup: "<main>About</main>",
            head,
            meta,
        }
    }

    #[test]
    fn test_default_document() {
        let head = HeadTags {
            title: vec!["<title>About</title>".to_string()],
            ..HeadTags::default()
        };
        let meta = Meta::new();
        let site = json!({ "title": "Site" });
        let props = json!({ "a": 1 });

        let html = DocumentBuilder::new(None, None)
            .assemble(&parts(&head, &meta, &site, Some(&props)))
            .unwrap();

        assert!(html.starts_with("<!DOCTYPE html><html lang=\"en\">"));
        assert!(html.contains("<title>About</title></head>"));
        assert!(html.contains(r#"<div id="root"><main>About</main></div>"#));
        assert!(html.contains(
            r#"window.__routeData = {"path":"/about","initialProps":{"a":1},"siteProps":{"title":"Site"}}"#
        ));
        assert!(html.ends_with(r#"<script async src="/app.js"></script></body></html>"#));
    }

    #[test]
    fn test_route_data_without_props() {
        let head = HeadTags::default();
        let meta = Meta::new();
        let site = json!({});

        let html = DocumentBuilder::new(None, None)
            .assemble(&parts(&head, &meta, &site, None))
            .unwrap();

        assert!(html.contains(r#"window.__routeData = {"path":"/about","siteProps":{}}"#));
    }

    #[test]
    fn test_route_data_cannot_close_script() {
        let head = HeadTags::default();
        let meta = Meta::new();
        let site = json!({ "evil": "</script><script>alert(1)</script>" });

        let html = DocumentBuilder::new(None, None)
            .assemble(&parts(&head, &meta, &site, None))
            .unwrap();

        assert!(!html.contains("</script><script>alert"));
        assert!(html.contains(r"<\/script>"));
    }

    #[test]
    fn test_custom_template_variables() {
        let head = HeadTags::default();
        let mut meta = Meta::new();
        meta.insert("styles".to_string(), json!("<style>.a{}</style>"));
        let site = json!({ "title": "Docs" });

        let template = "<html{{ html_attrs }}><head><title>{{ site.title }}</title>{{ meta.styles }}{{ meta.missing? }}</head><body{{ body_attrs }}>{{ body }}</body></html>";
        let html = DocumentBuilder::new(Some(template), None)
            .assemble(&parts(&head, &meta, &site, None))
            .unwrap();

        assert!(html.contains("<title>Docs</title><style>.a{}</style></head>"));
    }

    #[test]
    fn test_custom_template_missing_variable() {
        let head = HeadTags::default();
        let meta = Meta::new();
        let site = json!({});

        let result = DocumentBuilder::new(Some("{{ meta.styles }}"), None)
            .assemble(&parts(&head, &meta, &site, None));
        assert!(result.is_err());
    }

    #[test]
    fn test_script_json_escapes() {
        let value = json!({ "html": "</script>", "sep": "a\u{2028}b\u{2029}c" });
        let encoded = script_json(&value).unwrap();

        assert!(encoded.contains(r"<\/script>"));
        assert!(encoded.contains(r"a\u2028b\u2029c"));
    }

    #[test]
    fn test_script_json_reports_encoding_errors() {
        let unencodable = std::collections::BTreeMap::from([((1u8, 2u8), "tuple key")]);
        assert!(script_json(&unencodable).is_err());
    }

    #[test]
    fn test_rewrite_hrefs() {
        let html = r#"<a href="/about">a</a><a href='/blog/x'>b</a><a href="/">home</a><link href="//cdn.x/y.css"><a href="https://other.com/">c</a>"#;
        let rewritten = rewrite_hrefs(html, "https://x.com");

        assert!(rewritten.contains(r#"href="https://x.com/about""#));
        assert!(rewritten.contains(r#"href='https://x.com/blog/x'"#));
        assert!(rewritten.contains(r#"href="/""#));
        assert!(rewritten.contains(r#"href="//cdn.x/y.css""#));
        assert!(rewritten.contains(r#"href="https://other.com/""#));
    }

    #[test]
    fn test_rewrite_hrefs_literal_site_root() {
        assert_eq!(
            rewrite_hrefs(r#"<a href="/a">"#, "https://x.com/$1"),
            r#"<a href="https://x.com/$1/a">"#
        );
    }

    #[test]
    fn test_assemble_applies_site_root() {
        let head = HeadTags {
            link: vec![r#"<link rel="stylesheet" href="/style.css">"#.to_string()],
            ..HeadTags::default()
        };
        let meta = Meta::new();
        let site = json!({});

        let html = DocumentBuilder::new(None, Some("https://x.com"))
            .assemble(&parts(&head, &meta, &site, None))
            .unwrap();

        assert!(html.contains(r#"href="https://x.com/style.css""#));
    }
}
