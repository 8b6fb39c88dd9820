//! Route declarations and normalization.
//!
//! Users declare routes as a tree with relative paths. Normalization walks the
//! tree depth-first and produces a flat, ordered list of [`Route`]s with
//! absolute paths, inherited `noindex` flags and a guaranteed not-found entry.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    data::{DataSource, InlineData, JsonFile},
    error::{CoreError, Result},
};

/// Path every not-found route is served from.
pub const NOT_FOUND_PATH: &str = "/404";

/// A route as declared by the user, possibly with nested children.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteDecl {
    /// Path segment relative to the parent route.
    #[serde(default)]
    pub path: Option<String>,

    /// Component module, relative to the project root.
    #[serde(default)]
    pub component: Option<String>,

    /// Marks the catch-all not-found route.
    #[serde(default, alias = "is404")]
    pub is_404: bool,

    /// Exclude the route (and by default its children) from the sitemap.
    #[serde(default)]
    pub noindex: Option<bool>,

    /// Misspelled `noindex` accepted from older configurations.
    #[serde(default, rename = "noIndex")]
    pub legacy_no_index: Option<bool>,

    /// Inline route props.
    #[serde(default)]
    pub props: Option<Value>,

    /// JSON file holding the route props, relative to the project root.
    #[serde(default)]
    pub props_file: Option<PathBuf>,

    /// Sitemap priority.
    #[serde(default)]
    pub priority: Option<f32>,

    /// Sitemap last-modified value.
    #[serde(default)]
    pub last_modified: Option<String>,

    /// Nested routes.
    #[serde(default)]
    pub children: Vec<RouteDecl>,

    /// Data source producing the route props.
    #[serde(skip)]
    pub get_props: Option<Arc<dyn DataSource>>,
}

impl RouteDecl {
    /// Declare a route with the given path segment.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Declare the not-found route.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            is_404: true,
            ..Self::default()
        }
    }

    /// Set the component module.
    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Set the `noindex` flag explicitly.
    #[must_use]
    pub fn noindex(mut self, noindex: bool) -> Self {
        self.noindex = Some(noindex);
        self
    }

    /// Attach a props data source.
    #[must_use]
    pub fn with_props(mut self, source: impl DataSource + 'static) -> Self {
        self.get_props = Some(Arc::new(source));
        self
    }

    /// Add a child route.
    #[must_use]
    pub fn child(mut self, child: RouteDecl) -> Self {
        self.children.push(child);
        self
    }

    /// Turn `props` / `props_file` declarations into data sources, recursively.
    ///
    /// A data source that is already attached wins over the declarations.
    pub fn attach_data_sources(&mut self, root: &Path) -> Result<()> {
        if self.get_props.is_none() {
            self.get_props = match (self.props.take(), self.props_file.take()) {
                (Some(_), Some(_)) => {
                    return Err(CoreError::config(format!(
                        "route {} declares both `props` and `props_file`",
                        self.describe()
                    )));
                }
                (Some(value), None) => Some(Arc::new(InlineData::new(value))),
                (None, Some(file)) => Some(Arc::new(JsonFile::new(root.join(file)))),
                (None, None) => None,
            };
        }

        for child in &mut self.children {
            child.attach_data_sources(root)?;
        }

        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "{{ path: {:?}, component: {:?} }}",
            self.path.as_deref(),
            self.component.as_deref()
        )
    }
}

/// A normalized route: absolute path, no children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Absolute URL path.
    pub path: String,

    /// Whether this is the not-found route.
    pub is_404: bool,

    /// Whether the route is excluded from the sitemap.
    pub noindex: bool,

    /// Whether a props data source is attached.
    pub has_get_props: bool,

    /// Component module, relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    /// Sitemap priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f32>,

    /// Sitemap last-modified value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Props data source.
    #[serde(skip)]
    pub get_props: Option<Arc<dyn DataSource>>,
}

impl Route {
    /// The not-found route inserted when none is declared.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            path: NOT_FOUND_PATH.to_string(),
            is_404: true,
            noindex: false,
            has_get_props: false,
            component: None,
            priority: None,
            last_modified: None,
            get_props: None,
        }
    }
}

/// What a child inherits from its parent during the walk.
#[derive(Debug, Clone)]
struct Scope {
    path: String,
    noindex: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            noindex: false,
        }
    }
}

/// Flatten a declared route tree into normalized routes.
///
/// Parents come before their children and declaration order is preserved.
/// Duplicate paths are reported but kept; a `/404` route is appended when
/// none is declared.
pub fn normalize_routes(decls: Vec<RouteDecl>) -> Result<Vec<Route>> {
    let mut flat = Vec::new();
    let root = Scope::default();

    for decl in decls {
        flatten(decl, &root, &mut flat)?;
    }

    let mut seen = HashSet::new();
    for route in &flat {
        if !seen.insert(route.path.as_str()) {
            warn!(path = %route.path, "more than one route is defined for path");
        }
    }

    if !flat.iter().any(|r| r.is_404) {
        debug!("no not-found route declared, adding {NOT_FOUND_PATH}");
        flat.push(Route::not_found());
    }

    Ok(flat)
}

fn flatten(mut decl: RouteDecl, parent: &Scope, out: &mut Vec<Route>) -> Result<()> {
    if let Some(legacy) = decl.legacy_no_index.take() {
        warn!(
            path = decl.path.as_deref().unwrap_or_default(),
            "route is using 'noIndex'. Did you mean 'noindex'?"
        );
        decl.noindex = Some(legacy);
    }

    let path = if decl.is_404 {
        NOT_FOUND_PATH.to_string()
    } else {
        match decl.path.as_deref() {
            Some(segment) => path_join(&parent.path, segment),
            None => String::new(),
        }
    };

    if path.is_empty() {
        return Err(CoreError::route(format!(
            "No path defined for route: {}",
            decl.describe()
        )));
    }

    let scope = Scope {
        path: path.clone(),
        noindex: decl.noindex.unwrap_or(parent.noindex),
    };

    let children = std::mem::take(&mut decl.children);

    out.push(Route {
        path,
        is_404: decl.is_404,
        noindex: scope.noindex,
        has_get_props: decl.get_props.is_some(),
        component: decl.component,
        priority: decl.priority,
        last_modified: decl.last_modified,
        get_props: decl.get_props,
    });

    for child in children {
        flatten(child, &scope, out)?;
    }

    Ok(())
}

/// Join URL path segments, collapsing repeated slashes.
///
/// The result never ends with a slash unless it is the root.
#[must_use]
pub fn path_join(base: &str, segment: &str) -> String {
    let mut joined = String::with_capacity(base.len() + segment.len() + 1);

    for ch in base.chars().chain(std::iter::once('/')).chain(segment.chars()) {
        if ch == '/' && joined.ends_with('/') {
            continue;
        }
        joined.push(ch);
    }

    if joined.len() > 1 && joined.ends_with('/') {
        joined.pop();
    }

    joined
}

/// Resolve duplicate paths: the last declaration of a path wins.
///
/// Returns the surviving routes in the order of their positions in `routes`.
#[must_use]
pub fn last_declared(routes: &[Route]) -> Vec<&Route> {
    let last: HashMap<&str, usize> = routes
        .iter()
        .enumerate()
        .map(|(i, r)| (r.path.as_str(), i))
        .collect();

    routes
        .iter()
        .enumerate()
        .filter(|(i, r)| last.get(r.path.as_str()) == Some(i))
        .map(|(_, r)| r)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn paths(routes: &[Route]) -> Vec<&str> {
        routes.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn test_path_join() {
        assert_eq!(path_join("/", "/"), "/");
        assert_eq!(path_join("/", ""), "/");
        assert_eq!(path_join("/", "blog"), "/blog");
        assert_eq!(path_join("/", "/blog/"), "/blog");
        assert_eq!(path_join("/blog", ":id"), "/blog/:id");
        assert_eq!(path_join("/blog/", "//posts"), "/blog/posts");
    }

    #[test]
    fn test_nested_routes() {
        let routes = normalize_routes(vec![
            RouteDecl::new("/").component("Home"),
            RouteDecl::new("blog")
                .component("Blog")
                .child(RouteDecl::new(":id").component("Post")),
        ])
        .unwrap();

        assert_eq!(paths(&routes), vec!["/", "/blog", "/blog/:id", "/404"]);
        assert_eq!(routes[2].component.as_deref(), Some("Post"));
        assert!(routes[3].is_404);
        assert!(routes[3].component.is_none());
    }

    #[test]
    fn test_exactly_one_not_found() {
        let routes = normalize_routes(vec![
            RouteDecl::new("/"),
            RouteDecl::not_found().component("NotFound"),
        ])
        .unwrap();

        assert_eq!(routes.iter().filter(|r| r.is_404).count(), 1);
        let not_found = routes.iter().find(|r| r.is_404).unwrap();
        assert_eq!(not_found.path, NOT_FOUND_PATH);
        assert_eq!(not_found.component.as_deref(), Some("NotFound"));
    }

    #[test]
    fn test_empty_tree_gets_not_found() {
        let routes = normalize_routes(Vec::new()).unwrap();
        assert_eq!(paths(&routes), vec!["/404"]);
    }

    #[test]
    fn test_missing_path_fails() {
        let result = normalize_routes(vec![RouteDecl {
            component: Some("Orphan".to_string()),
            ..RouteDecl::default()
        }]);

        let err = result.unwrap_err();
        assert!(matches!(err, CoreError::Route(_)));
        assert!(err.to_string().contains("Orphan"));
    }

    #[test]
    fn test_noindex_inheritance() {
        let routes = normalize_routes(vec![
            RouteDecl::new("private")
                .noindex(true)
                .child(RouteDecl::new("inherits"))
                .child(RouteDecl::new("public").noindex(false).child(RouteDecl::new("deep"))),
            RouteDecl::new("open"),
        ])
        .unwrap();

        let by_path: HashMap<_, _> = routes.iter().map(|r| (r.path.as_str(), r.noindex)).collect();
        assert!(by_path["/private"]);
        assert!(by_path["/private/inherits"]);
        assert!(!by_path["/private/public"]);
        assert!(!by_path["/private/public/deep"]);
        assert!(!by_path["/open"]);
    }

    #[test]
    fn test_legacy_no_index() {
        let decl: RouteDecl = toml::from_str(
            r#"
path = "drafts"
noIndex = true
"#,
        )
        .unwrap();

        let routes = normalize_routes(vec![decl]).unwrap();
        assert!(routes[0].noindex);
    }

    #[test]
    fn test_has_get_props() {
        let routes = normalize_routes(vec![
            RouteDecl::new("/").with_props(InlineData::new(json!({ "a": 1 }))),
            RouteDecl::new("about"),
        ])
        .unwrap();

        assert!(routes[0].has_get_props);
        assert!(routes[0].get_props.is_some());
        assert!(!routes[1].has_get_props);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let routes = normalize_routes(vec![
            RouteDecl::new("about").component("A"),
            RouteDecl::new("/about/").component("B"),
        ])
        .unwrap();

        assert_eq!(paths(&routes), vec!["/about", "/about", "/404"]);
    }

    #[test]
    fn test_last_declared_wins() {
        let routes = normalize_routes(vec![
            RouteDecl::new("about").component("A"),
            RouteDecl::new("/"),
            RouteDecl::new("about").component("B"),
        ])
        .unwrap();

        let unique = last_declared(&routes);
        assert_eq!(
            unique.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
            vec!["/", "/about", "/404"]
        );
        assert_eq!(unique[1].component.as_deref(), Some("B"));
    }

    #[test]
    fn test_attach_data_sources() {
        let mut decl: RouteDecl = toml::from_str(
            r#"
path = "blog"
props = { title = "Blog" }

[[children]]
path = ":id"
props_file = "data/post.json"
"#,
        )
        .unwrap();

        decl.attach_data_sources(Path::new("/project")).unwrap();
        assert!(decl.get_props.is_some());
        assert!(decl.props.is_none());
        assert!(decl.children[0].get_props.is_some());

        let routes = normalize_routes(vec![decl]).unwrap();
        assert!(routes.iter().take(2).all(|r| r.has_get_props));
    }

    #[test]
    fn test_attach_data_sources_conflict() {
        let mut decl = RouteDecl::new("/");
        decl.props = Some(json!({}));
        decl.props_file = Some(PathBuf::from("data.json"));

        let err = decl.attach_data_sources(Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("props_file"));
    }

    #[test]
    fn test_route_serializes_camel_case() {
        let value = serde_json::to_value(Route::not_found()).unwrap();
        assert_eq!(value["path"], "/404");
        assert_eq!(value["is404"], true);
        assert_eq!(value["hasGetProps"], false);
        assert!(value.get("component").is_none());
    }
}
