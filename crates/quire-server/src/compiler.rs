//! Route Compiler: page records in, routes out.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use quire_pages::{PageList, PageRecord};
use quire_views::{RawResponse, View, ViewContext, ViewOutput, ViewResolver};

use crate::error::ServerError;
use crate::pattern::RoutePattern;
use crate::render::Render;

/// What a route does with a matching request.
#[derive(Clone)]
pub enum RouteHandler {
    /// Unconditional redirect.
    Redirect {
        location: HeaderValue,
        status: StatusCode,
    },
    /// Render the page through its view.
    View {
        view: Arc<dyn View>,
        status: Option<StatusCode>,
    },
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redirect { location, status } => f
                .debug_struct("Redirect")
                .field("location", location)
                .field("status", status)
                .finish(),
            Self::View { status, .. } => f.debug_struct("View").field("status", status).finish(),
        }
    }
}

impl RouteHandler {
    /// Short label for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Redirect { .. } => "redirect",
            Self::View { .. } => "view",
        }
    }

    /// Answer one request.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::View`] when the view fails and
    /// [`ServerError::InvalidResponse`] when its raw response cannot be sent.
    pub fn respond(&self, cx: &ViewContext<'_>, render: &dyn Render) -> Result<Response, ServerError> {
        match self {
            Self::Redirect { location, status } => {
                Ok((*status, [(header::LOCATION, location.clone())]).into_response())
            }
            Self::View { view, status } => {
                let output = view.render(cx).map_err(|source| ServerError::View {
                    page: cx.page.file.clone(),
                    source,
                })?;

                let mut response = match output {
                    ViewOutput::Response(raw) => return raw_response(raw, cx.page),
                    ViewOutput::Markup(markup) => render.render(markup),
                    ViewOutput::Empty => render.render(String::new()),
                };
                if let Some(status) = status {
                    *response.status_mut() = *status;
                }
                Ok(response)
            }
        }
    }
}

/// A registered pattern and its handler.
#[derive(Clone, Debug)]
pub struct Route {
    pattern: RoutePattern,
    handler: RouteHandler,
    page: usize,
}

impl Route {
    /// Pattern the route answers.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Handler invoked on a match.
    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    /// Position of the route's page in the page list.
    pub fn page_index(&self) -> usize {
        self.page
    }
}

/// Compile one record into a handler.
///
/// Redirect records never touch the resolver. Other records need a view;
/// without one the record is skipped (the resolver has already logged why).
pub fn compile(record: &PageRecord, resolver: &ViewResolver) -> Option<RouteHandler> {
    if let Some(redirect) = &record.redirect {
        let location = match HeaderValue::try_from(redirect.as_str()) {
            Ok(location) => location,
            Err(err) => {
                tracing::warn!(
                    page = %record.file.display(),
                    redirect = %redirect,
                    error = %err,
                    "Invalid redirect destination, route not registered"
                );
                return None;
            }
        };
        let status = record
            .status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::FOUND);
        return Some(RouteHandler::Redirect { location, status });
    }

    let view = resolver.resolve(record)?;
    let status = record.status.and_then(|code| StatusCode::from_u16(code).ok());
    Some(RouteHandler::View { view, status })
}

/// Compile every record of `pages`, keeping their order.
pub fn compile_routes(pages: &PageList, resolver: &ViewResolver) -> Vec<Route> {
    let mut seen = HashSet::new();
    let mut routes = Vec::with_capacity(pages.len());

    for (index, record) in pages.iter().enumerate() {
        let pattern = match RoutePattern::parse(&record.path) {
            Ok(pattern) => pattern,
            Err(err) => {
                tracing::warn!(page = %record.file.display(), error = %err, "Invalid route pattern, route not registered");
                continue;
            }
        };
        let Some(handler) = compile(record, resolver) else {
            continue;
        };

        if !seen.insert(record.path.clone()) {
            tracing::warn!(
                page = %record.file.display(),
                path = %record.path,
                "Duplicate route, shadowed by an earlier page"
            );
        }
        tracing::debug!(path = %record.path, kind = handler.kind(), "Route registered");

        routes.push(Route {
            pattern,
            handler,
            page: index,
        });
    }

    routes
}

fn raw_response(raw: RawResponse, page: &PageRecord) -> Result<Response, ServerError> {
    let invalid = |message: String| ServerError::InvalidResponse {
        page: page.file.clone(),
        message,
    };

    let status = StatusCode::from_u16(raw.status).map_err(|err| invalid(err.to_string()))?;
    let mut response = (status, raw.body).into_response();
    for (name, value) in raw.headers {
        let name = HeaderName::try_from(name.as_str()).map_err(|err| invalid(format!("{name}: {err}")))?;
        let value = HeaderValue::try_from(value.as_str()).map_err(|err| invalid(format!("{name}: {err}")))?;
        response.headers_mut().insert(name, value);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HtmlRender;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use quire_views::{RequestContext, ViewError, ViewRegistry};
    use std::path::Path;

    fn record(file: &str, path: &str) -> PageRecord {
        PageRecord {
            file: Path::new("/site/pages").join(file),
            path: path.to_owned(),
            status: None,
            view: None,
            redirect: None,
            data: serde_json::Map::new(),
        }
    }

    fn with_view(mut record: PageRecord, view: &str) -> PageRecord {
        record.view = Some(Path::new("/site/views").join(view));
        record
    }

    fn resolver() -> ViewResolver {
        let registry = ViewRegistry::new()
            .with("page", |cx: &ViewContext<'_>| {
                Ok::<_, ViewError>(ViewOutput::from(format!("<p>{}</p>", cx.page.path)))
            })
            .with("empty", |_: &ViewContext<'_>| Ok::<_, ViewError>(ViewOutput::Empty))
            .with("raw", |_: &ViewContext<'_>| {
                Ok::<_, ViewError>(ViewOutput::from(
                    RawResponse::new(202).with_header("x-raw", "yes").with_body("raw body"),
                ))
            })
            .with("bad-raw", |_: &ViewContext<'_>| {
                Ok::<_, ViewError>(ViewOutput::from(RawResponse::new(42)))
            })
            .with("failing", |_: &ViewContext<'_>| {
                Err::<ViewOutput, _>(ViewError::other("boom"))
            });
        ViewResolver::new("/site/views", registry)
    }

    async fn respond(handler: &RouteHandler, page: &PageRecord) -> Result<(StatusCode, String), ServerError> {
        let pages = PageList::default();
        let request = RequestContext::default();
        let cx = ViewContext {
            request: &request,
            pages: &pages,
            page,
        };
        let response = handler.respond(&cx, &HtmlRender)?;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Ok((status, String::from_utf8(body.to_vec()).unwrap()))
    }

    #[test]
    fn test_redirect_defaults_to_found() {
        let mut page = record("old.json", "/old");
        page.redirect = Some("/new".to_owned());

        let handler = compile(&page, &resolver()).unwrap();

        assert_eq!(handler.kind(), "redirect");
        let RouteHandler::Redirect { status, .. } = handler else {
            panic!("expected a redirect");
        };
        assert_eq!(status, StatusCode::FOUND);
    }

    #[test]
    fn test_redirect_uses_status() {
        let mut page = record("old.json", "/old");
        page.redirect = Some("/new".to_owned());
        page.status = Some(301);

        let RouteHandler::Redirect { location, status } = compile(&page, &resolver()).unwrap() else {
            panic!("expected a redirect");
        };
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location, "/new");
    }

    #[test]
    fn test_missing_view_is_skipped() {
        assert!(compile(&record("a.json", "/a"), &resolver()).is_none());
        assert!(compile(&with_view(record("a.json", "/a"), "nope"), &resolver()).is_none());
    }

    #[tokio::test]
    async fn test_view_applies_status() {
        let mut page = with_view(record("gone.json", "/gone"), "page");
        page.status = Some(410);
        let handler = compile(&page, &resolver()).unwrap();

        let (status, body) = respond(&handler, &page).await.unwrap();

        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body, "<p>/gone</p>");
    }

    #[tokio::test]
    async fn test_empty_output_renders_empty_body() {
        let page = with_view(record("e.json", "/e"), "empty");
        let handler = compile(&page, &resolver()).unwrap();

        assert_eq!(
            respond(&handler, &page).await.unwrap(),
            (StatusCode::OK, String::new())
        );
    }

    #[tokio::test]
    async fn test_raw_response_is_verbatim() {
        let mut page = with_view(record("r.json", "/r"), "raw");
        page.status = Some(404);
        let handler = compile(&page, &resolver()).unwrap();

        assert_eq!(
            respond(&handler, &page).await.unwrap(),
            (StatusCode::ACCEPTED, "raw body".to_owned())
        );
    }

    #[tokio::test]
    async fn test_view_errors_propagate() {
        let page = with_view(record("f.json", "/f"), "failing");
        let handler = compile(&page, &resolver()).unwrap();
        assert!(matches!(
            respond(&handler, &page).await,
            Err(ServerError::View { .. })
        ));

        let page = with_view(record("b.json", "/b"), "bad-raw");
        let handler = compile(&page, &resolver()).unwrap();
        assert!(matches!(
            respond(&handler, &page).await,
            Err(ServerError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_compile_routes_keeps_order_and_skips_broken() {
        let mut redirect = record("old.json", "/old");
        redirect.redirect = Some("/new".to_owned());
        let pages = PageList::from_unordered(
            vec![
                with_view(record("a/b.json", "/a/b"), "page"),
                with_view(record("a/c.json", "/a/c"), "missing"),
                with_view(record("bad.json", "/x/:"), "page"),
                redirect,
                with_view(record("z.json", "/*"), "page"),
            ],
            Path::new("/site/pages"),
        );

        let routes = compile_routes(&pages, &resolver());
        let listed: Vec<_> = routes
            .iter()
            .map(|r| (r.pattern().as_str(), r.handler().kind(), pages[r.page_index()].path.as_str()))
            .collect();

        assert_eq!(
            listed,
            vec![("/a/b", "view", "/a/b"), ("/*", "view", "/*"), ("/old", "redirect", "/old")]
        );
    }
}
