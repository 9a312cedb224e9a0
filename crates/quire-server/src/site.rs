//! One build of the site: index, views and routes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quire_pages::{MarkdownRenderer, PageList, PageLoader, PageRecord, build_index};
use quire_views::{ViewRegistry, ViewResolver};

use crate::compiler::{Route, compile_routes};
use crate::pattern::canonical_path;
use crate::render::{HtmlRender, Render};

/// Inputs for building a [`CompiledSite`].
///
/// Cheap to clone; the watcher keeps one and rebuilds from it on every change.
#[derive(Clone)]
pub struct SiteBuilder {
    pages_dir: PathBuf,
    views_dir: PathBuf,
    registry: ViewRegistry,
    markdown: Option<Arc<dyn MarkdownRenderer>>,
    render: Arc<dyn Render>,
}

impl SiteBuilder {
    /// Create a builder for the given pages and views directories.
    pub fn new(pages_dir: impl Into<PathBuf>, views_dir: impl Into<PathBuf>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            views_dir: views_dir.into(),
            registry: ViewRegistry::new(),
            markdown: None,
            render: Arc::new(HtmlRender),
        }
    }

    /// Use `registry` for native views.
    #[must_use]
    pub fn with_views(mut self, registry: ViewRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the markdown renderer for front-matter documents.
    #[must_use]
    pub fn with_markdown(mut self, markdown: Arc<dyn MarkdownRenderer>) -> Self {
        self.markdown = Some(markdown);
        self
    }

    /// Replace the rendering capability.
    #[must_use]
    pub fn with_render(mut self, render: Arc<dyn Render>) -> Self {
        self.render = render;
        self
    }

    /// Pages directory.
    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Views directory.
    pub fn views_dir(&self) -> &Path {
        &self.views_dir
    }

    /// Build the index and compile every page into a route.
    ///
    /// Never fails: broken pages and views are logged and left out.
    pub fn build(&self) -> CompiledSite {
        let mut loader = PageLoader::new(&self.pages_dir, &self.views_dir);
        if let Some(markdown) = &self.markdown {
            loader = loader.with_markdown(Arc::clone(markdown));
        }

        let pages = build_index(&loader);
        let resolver = ViewResolver::new(loader.views_root(), self.registry.clone());
        let routes = compile_routes(&pages, &resolver);

        tracing::info!(
            pages = pages.len(),
            routes = routes.len(),
            "Site built"
        );

        CompiledSite {
            pages: Arc::new(pages),
            routes,
            render: Arc::clone(&self.render),
        }
    }
}

impl fmt::Debug for SiteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteBuilder")
            .field("pages_dir", &self.pages_dir)
            .field("views_dir", &self.views_dir)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Routes of one build, in registration order, with the pages they serve.
///
/// Immutable; a rebuild produces a new value.
pub struct CompiledSite {
    pages: Arc<PageList>,
    routes: Vec<Route>,
    render: Arc<dyn Render>,
}

impl CompiledSite {
    /// All pages of the build.
    pub fn pages(&self) -> &PageList {
        &self.pages
    }

    /// Compiled routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Rendering capability for markup.
    pub fn render(&self) -> &dyn Render {
        self.render.as_ref()
    }

    /// Page served by `route`.
    pub fn page(&self, route: &Route) -> &PageRecord {
        &self.pages[route.page_index()]
    }

    /// First route matching `path`, with its captured parameters.
    pub fn find(&self, path: &str) -> Option<(&Route, BTreeMap<String, String>)> {
        let path = canonical_path(path);
        self.routes
            .iter()
            .find_map(|route| route.pattern().matches_canonical(&path).map(|params| (route, params)))
    }
}

impl fmt::Debug for CompiledSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSite")
            .field("pages", &self.pages.len())
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_views::{ViewContext, ViewError, ViewOutput};
    use std::fs;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_build_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("pages");
        write(&pages, "test.json", r#"{"view": "page"}"#);
        write(&pages, "catchall.json", r#"{"path": "/*", "view": "page"}"#);
        write(&pages, "posts/post.json", r#"{"path": "/posts/:slug", "view": "page"}"#);

        let site = SiteBuilder::new(&pages, dir.path().join("views"))
            .with_views(ViewRegistry::new().with("page", |_: &ViewContext<'_>| {
                Ok::<_, ViewError>(ViewOutput::Empty)
            }))
            .build();

        let patterns: Vec<_> = site.routes().iter().map(|r| r.pattern().as_str()).collect();
        assert_eq!(patterns, vec!["/posts/:slug", "/test", "/*"]);

        let (route, _) = site.find("/test").unwrap();
        assert_eq!(site.page(route).file, pages.join("test.json"));

        let (route, params) = site.find("/posts/hello").unwrap();
        assert_eq!(route.pattern().as_str(), "/posts/:slug");
        assert_eq!(params.get("slug").map(String::as_str), Some("hello"));

        let (route, params) = site.find("/other/deep").unwrap();
        assert_eq!(route.pattern().as_str(), "/*");
        assert_eq!(params.get("wildcard").map(String::as_str), Some("other/deep"));
    }

    #[test]
    fn test_empty_site() {
        let dir = tempfile::tempdir().unwrap();
        let site = SiteBuilder::new(dir.path().join("pages"), dir.path().join("views")).build();

        assert!(site.pages().is_empty());
        assert!(site.find("/").is_none());
    }
}
