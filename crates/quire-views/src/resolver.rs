//! View Resolver: from a page's `view` reference to something that renders.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use minijinja::{Environment, ErrorKind};
use quire_pages::PageRecord;

use crate::registry::ViewRegistry;
use crate::template::{TEMPLATE_EXTENSIONS, TemplateView, environment};
use crate::view::View;

/// Why a page has no usable view.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The page names no view.
    #[error("no view defined")]
    NoView,
    /// The view does not exist, lies outside the views root, or is of an
    /// unsupported kind.
    #[error("view not found or not supported")]
    NotFound,
    /// The view exists but could not be loaded.
    #[error("failed to load view: {0}")]
    Load(#[source] minijinja::Error),
    /// The view loaded but provides nothing to render.
    #[error("view has no default export")]
    NoDefaultExport,
}

/// Resolves page records to views.
///
/// Registered native views win over template files. Template views share one
/// environment per resolver, so a resolver should live exactly as long as one
/// build of the site.
pub struct ViewResolver {
    views_root: PathBuf,
    registry: ViewRegistry,
    env: Arc<Environment<'static>>,
}

impl ViewResolver {
    /// Create a resolver for `views_root`.
    pub fn new(views_root: impl Into<PathBuf>, registry: ViewRegistry) -> Self {
        let views_root = views_root.into();
        let env = Arc::new(environment(&views_root));
        Self {
            views_root,
            registry,
            env,
        }
    }

    /// Views root.
    pub fn views_root(&self) -> &Path {
        &self.views_root
    }

    /// Resolve the view for `page`, logging a warning when there is none.
    pub fn resolve(&self, page: &PageRecord) -> Option<Arc<dyn View>> {
        match self.try_resolve(page) {
            Ok(view) => Some(view),
            Err(err) => {
                tracing::warn!(
                    page = %page.file.display(),
                    view = page.view.as_ref().map(|v| v.display().to_string()),
                    error = %err,
                    "No view for page, route not registered"
                );
                None
            }
        }
    }

    /// Resolve the view for `page`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] describing why the page cannot be rendered.
    pub fn try_resolve(&self, page: &PageRecord) -> Result<Arc<dyn View>, ResolveError> {
        let view = page.view.as_deref().ok_or(ResolveError::NoView)?;
        let id = self.view_id(view).ok_or(ResolveError::NotFound)?;

        if let Some(native) = self.registry.get(&id) {
            return Ok(native);
        }

        let name = self.template_name(&id).ok_or(ResolveError::NotFound)?;
        let template = self.env.get_template(&name).map_err(|err| match err.kind() {
            ErrorKind::TemplateNotFound => ResolveError::NotFound,
            _ => ResolveError::Load(err),
        })?;
        if template.source().trim().is_empty() {
            return Err(ResolveError::NoDefaultExport);
        }

        Ok(Arc::new(TemplateView::new(Arc::clone(&self.env), name)))
    }

    /// `/`-joined identifier of `view` relative to the views root.
    fn view_id(&self, view: &Path) -> Option<String> {
        let relative = view.strip_prefix(&self.views_root).unwrap_or(view);
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    /// Template file name for `id`, probing extensions when it has none.
    fn template_name(&self, id: &str) -> Option<String> {
        match Path::new(id).extension().and_then(|e| e.to_str()) {
            Some(ext) => TEMPLATE_EXTENSIONS.contains(&ext).then(|| id.to_owned()),
            None => TEMPLATE_EXTENSIONS
                .iter()
                .map(|ext| format!("{id}.{ext}"))
                .find(|name| self.views_root.join(name).is_file()),
        }
    }
}
