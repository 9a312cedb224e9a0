//! Template views backed by minijinja.

use std::path::Path;
use std::sync::Arc;

use minijinja::{Environment, context};

use crate::view::{RawResponse, View, ViewContext, ViewError, ViewOutput};

/// File extensions recognized as template views.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["html", "jinja", "jinja2", "j2"];

/// Build a template environment loading from `views_root`.
///
/// Templates may `{% extends %}` and `{% include %}` each other by their path
/// relative to the views root.
pub fn environment(views_root: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader(views_root));
    env
}

/// A view rendered from a template file.
///
/// The template sees `request`, `pages` and `page`. A template that sets a
/// `response` variable (`{% set response = {"status": 204} %}`) produces that
/// response verbatim; otherwise its output is markup. Whitespace-only output
/// counts as no output.
pub struct TemplateView {
    env: Arc<Environment<'static>>,
    name: String,
}

impl TemplateView {
    /// Create a view for template `name` in `env`.
    pub fn new(env: Arc<Environment<'static>>, name: impl Into<String>) -> Self {
        Self {
            env,
            name: name.into(),
        }
    }
}

impl View for TemplateView {
    fn render(&self, cx: &ViewContext<'_>) -> Result<ViewOutput, ViewError> {
        let template = self.env.get_template(&self.name)?;
        let captured = template.render_captured(context! {
            request => cx.request,
            pages => cx.pages,
            page => cx.page,
        })?;

        if let Some(response) = captured
            .state()
            .lookup("response")
            .filter(|v| !v.is_undefined() && !v.is_none())
        {
            let raw: RawResponse = serde_json::from_value(serde_json::to_value(&response)?)?;
            return Ok(ViewOutput::Response(raw));
        }

        if captured.output().trim().is_empty() {
            Ok(ViewOutput::Empty)
        } else {
            Ok(ViewOutput::Markup(captured.into_output()))
        }
    }
}
