//! Head metadata collected while rendering a route.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Document-level tags and attributes contributed by the rendered application.
///
/// Tag groups hold already-rendered tags (`<meta name="…">`) exactly as the
/// rendering engine produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadTags {
    /// Attributes for the `<html>` element.
    pub html_attributes: BTreeMap<String, String>,

    /// Attributes for the `<body>` element.
    pub body_attributes: BTreeMap<String, String>,

    pub base: Vec<String>,
    pub link: Vec<String>,
    pub meta: Vec<String>,
    pub noscript: Vec<String>,
    pub script: Vec<String>,
    pub style: Vec<String>,
    pub title: Vec<String>,
}

impl HeadTags {
    /// Tags for the `<head>` element, in base, link, meta, noscript, script,
    /// style, title order.
    #[must_use]
    pub fn head_html(&self) -> String {
        [
            &self.base,
            &self.link,
            &self.meta,
            &self.noscript,
            &self.script,
            &self.style,
            &self.title,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect()
    }

    /// Rendered `<html>` attributes; `lang` defaults to `en`.
    #[must_use]
    pub fn html_attrs(&self) -> String {
        let mut attrs = self.html_attributes.clone();
        attrs
            .entry("lang".to_string())
            .or_insert_with(|| "en".to_string());
        render_attrs(&attrs)
    }

    /// Rendered `<body>` attributes.
    #[must_use]
    pub fn body_attrs(&self) -> String {
        render_attrs(&self.body_attributes)
    }
}

/// Render attributes as ` name="value"` pairs, each with a leading space.
#[must_use]
pub fn render_attrs(attrs: &BTreeMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(r#" {name}="{}""#, escape_attr(value)))
        .collect()
}

/// Escape a value for a double-quoted HTML attribute.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
