//! Rendering capability: markup in, HTTP response out.

use axum::response::{Html, IntoResponse, Response};

/// Turns view markup into a response.
///
/// The route handler applies the page's status afterwards, so implementations
/// should leave the status alone.
pub trait Render: Send + Sync {
    fn render(&self, markup: String) -> Response;
}

/// Serves markup as `text/html; charset=utf-8`.
///
/// A document starting with `<html` gets a `<!DOCTYPE html>` prefix.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRender;

impl Render for HtmlRender {
    fn render(&self, markup: String) -> Response {
        let markup = if markup.trim_start().starts_with("<html") {
            format!("<!DOCTYPE html>\n{markup}")
        } else {
            markup
        };
        Html(markup).into_response()
    }
}
