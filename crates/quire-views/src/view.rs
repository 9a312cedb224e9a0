//! The view capability.

use std::collections::BTreeMap;

use quire_pages::{PageList, PageRecord};
use serde::{Deserialize, Serialize};

/// Request data handed to views.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    /// HTTP method (`GET` or `HEAD`).
    pub method: String,
    /// Request path as received.
    pub path: String,
    /// Captured route parameters, percent-decoded.
    pub params: BTreeMap<String, String>,
    /// Query string parameters.
    pub query: BTreeMap<String, String>,
    /// Request headers with lowercase names. Non-UTF-8 values are dropped.
    pub headers: BTreeMap<String, String>,
}

/// Everything a view gets for one request.
#[derive(Clone, Copy, Debug)]
pub struct ViewContext<'a> {
    /// The incoming request.
    pub request: &'a RequestContext,
    /// Every page of the current build, in registration order.
    pub pages: &'a PageList,
    /// The page being rendered.
    pub page: &'a PageRecord,
}

/// A fully formed response produced by a view, sent verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: String,
}

impl Default for RawResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }
}

impl RawResponse {
    /// Create an empty response with the given status.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Create a redirect to `location`.
    #[must_use]
    pub fn redirect(location: impl Into<String>, status: u16) -> Self {
        Self::new(status).with_header("location", location)
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// What a view produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewOutput {
    /// Markup for the rendering capability.
    Markup(String),
    /// A ready-made response that bypasses rendering.
    Response(RawResponse),
    /// Nothing; rendered as an empty body.
    Empty,
}

impl From<String> for ViewOutput {
    fn from(markup: String) -> Self {
        Self::Markup(markup)
    }
}

impl From<&str> for ViewOutput {
    fn from(markup: &str) -> Self {
        Self::Markup(markup.to_owned())
    }
}

impl From<RawResponse> for ViewOutput {
    fn from(response: RawResponse) -> Self {
        Self::Response(response)
    }
}

/// Error raised by a view while rendering.
///
/// Not swallowed by the route handler: it surfaces to the server's error
/// handling.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    /// A template's `response` variable could not be read as a response.
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    /// Any other failure from a native view.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ViewError {
    /// Wrap an arbitrary error or message.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }
}

/// A render function: (request, pages, page) in, output out.
///
/// Implemented for closures, so native views can be registered directly:
///
/// ```ignore
/// registry.register("home", |cx: &ViewContext<'_>| {
///     Ok(ViewOutput::from(format!("<h1>{}</h1>", cx.page.path)))
/// });
/// ```
pub trait View: Send + Sync {
    /// Render the page for one request.
    fn render(&self, cx: &ViewContext<'_>) -> Result<ViewOutput, ViewError>;
}

impl<F> View for F
where
    F: Fn(&ViewContext<'_>) -> Result<ViewOutput, ViewError> + Send + Sync,
{
    fn render(&self, cx: &ViewContext<'_>) -> Result<ViewOutput, ViewError> {
        self(cx)
    }
}
