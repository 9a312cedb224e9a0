//! Views for quire pages.
//!
//! A page names a view relative to the views root. The [`ViewResolver`]
//! turns that reference into a [`View`]: either a native view registered in a
//! [`ViewRegistry`], or a minijinja template file (`.html`, `.jinja`,
//! `.jinja2`, `.j2`). Views receive a [`ViewContext`] and return
//! [`ViewOutput`]: markup, a raw response, or nothing.

mod registry;
mod resolver;
mod template;
mod view;

pub use registry::ViewRegistry;
pub use resolver::{ResolveError, ViewResolver};
pub use template::{TEMPLATE_EXTENSIONS, TemplateView};
pub use view::{RawResponse, RequestContext, View, ViewContext, ViewError, ViewOutput};
