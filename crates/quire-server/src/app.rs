//! Router construction and request dispatch.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::Response;
use quire_views::{RequestContext, ViewContext};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::site::CompiledSite;

/// The site currently being served.
///
/// Requests load it once and keep that build until they finish; a rebuild
/// stores a new one without touching requests already in flight.
pub type SiteHandle = Arc<ArcSwap<CompiledSite>>;

/// Wrap a freshly built site in a handle.
pub fn site_handle(site: CompiledSite) -> SiteHandle {
    Arc::new(ArcSwap::from_pointee(site))
}

/// Create the application router.
///
/// Files under `static_dir` are served first; everything they don't answer
/// goes to the compiled routes.
pub fn create_router(handle: SiteHandle, static_dir: Option<&Path>) -> Router {
    let pages = Router::new().fallback(dispatch).with_state(handle);

    let router = match static_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            tracing::debug!(dir = %dir.display(), "Serving static files");
            Router::new().fallback_service(
                ServeDir::new(dir)
                    .call_fallback_on_method_not_allowed(true)
                    .fallback(pages),
            )
        }
        None => pages,
    };

    router.layer(TraceLayer::new_for_http())
}

/// Route a request through the current site, first match wins.
async fn dispatch(State(handle): State<SiteHandle>, request: Request) -> Result<Response, ServerError> {
    let site = handle.load_full();
    let path = request.uri().path();

    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return Err(ServerError::NotFound(path.to_owned()));
    }
    let Some((route, params)) = site.find(path) else {
        return Err(ServerError::NotFound(path.to_owned()));
    };

    let context = request_context(&request, params);
    let cx = ViewContext {
        request: &context,
        pages: site.pages(),
        page: site.page(route),
    };
    route.handler().respond(&cx, site.render())
}

fn request_context(request: &Request, params: BTreeMap<String, String>) -> RequestContext {
    let query = request
        .uri()
        .query()
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default();
    let headers = request
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_owned(), value.to_str().ok()?.to_owned())))
        .collect();

    RequestContext {
        method: request.method().as_str().to_owned(),
        path: request.uri().path().to_owned(),
        params,
        query,
        headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::SiteBuilder;
    use axum::body::{Body, to_bytes};
    use axum::http::{StatusCode, header};
    use pretty_assertions::assert_eq;
    use quire_views::{RawResponse, ViewError, ViewOutput, ViewRegistry};
    use std::fs;
    use std::io;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct Site {
        dir: tempfile::TempDir,
    }

    impl Site {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn write(&self, name: &str, content: &str) -> &Self {
            let path = self.dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }

        fn builder(&self) -> SiteBuilder {
            let registry = ViewRegistry::new()
                .with("echo", |cx: &ViewContext<'_>| {
                    let title = cx.page.get("title").and_then(|t| t.as_str()).unwrap_or("");
                    Ok::<_, ViewError>(ViewOutput::from(format!(
                        "{} {} {:?} {}",
                        cx.page.path,
                        title,
                        cx.request.params,
                        cx.pages.len()
                    )))
                })
                .with("teapot", |_: &ViewContext<'_>| {
                    Ok::<_, ViewError>(ViewOutput::from(
                        RawResponse::new(418).with_header("x-kind", "teapot").with_body("short"),
                    ))
                })
                .with("nothing", |_: &ViewContext<'_>| Ok::<_, ViewError>(ViewOutput::Empty))
                .with("query", |cx: &ViewContext<'_>| {
                    Ok::<_, ViewError>(ViewOutput::from(format!("{:?}", cx.request.query)))
                })
                .with("failing", |_: &ViewContext<'_>| {
                    Err::<ViewOutput, _>(ViewError::other("boom"))
                });
            SiteBuilder::new(self.dir.path().join("pages"), self.dir.path().join("views"))
                .with_views(registry)
        }

        fn handle(&self) -> SiteHandle {
            site_handle(self.builder().build())
        }

        fn router(&self) -> Router {
            create_router(self.handle(), Some(self.dir.path().join("static").as_path()))
        }
    }

    async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, Response) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, String) {
        let (status, response) = send(router, Method::GET, uri).await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_explicit_path_overrides_file_name() {
        let site = Site::new();
        site.write(
            "pages/blog/01-uno.md",
            "---\npath: /blog/uno\nview: echo\ntitle: Uno\n---\nHola\n",
        );

        assert_eq!(
            get(site.router(), "/blog/uno").await,
            (StatusCode::OK, "/blog/uno Uno {} 1".to_owned())
        );
        assert_eq!(get(site.router(), "/blog/01-uno").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_file_names_needing_encoding_are_reachable() {
        let site = Site::new();
        site.write("pages/café.json", r#"{"view": "echo"}"#);
        site.write("pages/my page.json", r#"{"view": "echo"}"#);

        assert_eq!(
            get(site.router(), "/caf%C3%A9").await,
            (StatusCode::OK, "/café  {} 2".to_owned())
        );
        assert_eq!(
            get(site.router(), "/my%20page/").await,
            (StatusCode::OK, "/my page  {} 2".to_owned())
        );
        assert_eq!(get(site.router(), "/cafe").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rooted_view_name_resolves() {
        let site = Site::new();
        site.write("pages/home.json", r#"{"view": "/echo", "title": "Home"}"#);

        assert_eq!(
            get(site.router(), "/home").await,
            (StatusCode::OK, "/home Home {} 1".to_owned())
        );
    }

    #[tokio::test]
    async fn test_nested_index_serves_directory_route() {
        let site = Site::new();
        site.write("pages/blog/index/index.json", r#"{"view": "echo"}"#);

        assert_eq!(
            get(site.router(), "/blog").await,
            (StatusCode::OK, "/blog  {} 1".to_owned())
        );
        assert_eq!(get(site.router(), "/blog/").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_concrete_route_beats_wildcard() {
        let site = Site::new();
        site.write("pages/test.json", r#"{"view": "echo", "title": "concrete"}"#)
            .write("pages/catchall.json", r#"{"path": "/*", "view": "echo", "title": "wild"}"#);

        assert_eq!(
            get(site.router(), "/test").await,
            (StatusCode::OK, "/test concrete {} 2".to_owned())
        );
        assert_eq!(
            get(site.router(), "/other").await,
            (StatusCode::OK, r#"/* wild {"wildcard": "other"} 2"#.to_owned())
        );
    }

    #[tokio::test]
    async fn test_unmatched_path_is_not_found() {
        let site = Site::new();
        site.write("pages/about.json", r#"{"view": "echo"}"#);

        assert_eq!(
            get(site.router(), "/missing").await,
            (StatusCode::NOT_FOUND, "Not Found".to_owned())
        );
    }

    #[tokio::test]
    async fn test_missing_pages_dir_serves_nothing() {
        let site = Site::new();
        assert_eq!(get(site.router(), "/").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_redirect_with_status() {
        let site = Site::new();
        site.write("pages/old.json", r#"{"redirect": "/new", "status": 301}"#);

        let (status, response) = send(site.router(), Method::GET, "/old").await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/new");
    }

    #[tokio::test]
    async fn test_missing_view_does_not_block_other_pages() {
        let site = Site::new();
        site.write("pages/broken.json", r#"{"view": "does-not-exist"}"#)
            .write("pages/fine.json", r#"{"view": "echo"}"#);

        assert_eq!(get(site.router(), "/broken").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get(site.router(), "/fine").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_raw_response_passes_through() {
        let site = Site::new();
        site.write("pages/tea.json", r#"{"view": "teapot", "status": 200}"#);

        let (status, response) = send(site.router(), Method::GET, "/tea").await;

        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()["x-kind"], "teapot");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"short");
    }

    #[tokio::test]
    async fn test_status_applied_to_rendered_page() {
        let site = Site::new();
        site.write("pages/404.json", r#"{"view": "nothing", "status": 404}"#);

        let (status, response) = send(site.router(), Method::GET, "/404").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_query_reaches_view() {
        let site = Site::new();
        site.write("pages/search.json", r#"{"view": "query"}"#);

        assert_eq!(
            get(site.router(), "/search?q=rust&page=2").await,
            (StatusCode::OK, r#"{"page": "2", "q": "rust"}"#.to_owned())
        );
    }

    #[tokio::test]
    async fn test_view_error_is_server_error() {
        let site = Site::new();
        site.write("pages/fail.json", r#"{"view": "failing"}"#);

        assert_eq!(
            get(site.router(), "/fail").await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_only_get_and_head_are_routed() {
        let site = Site::new();
        site.write("pages/about.json", r#"{"view": "echo"}"#);

        assert_eq!(send(site.router(), Method::HEAD, "/about").await.0, StatusCode::OK);
        assert_eq!(
            send(site.router(), Method::POST, "/about").await.0,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_template_view_from_views_dir() {
        let site = Site::new();
        site.write("pages/index.yaml", "view: home.html\ntitle: Home\n")
            .write("views/home.html", "<html><h1>{{ page.title }}</h1></html>");

        assert_eq!(
            get(site.router(), "/").await,
            (
                StatusCode::OK,
                "<!DOCTYPE html>\n<html><h1>Home</h1></html>".to_owned()
            )
        );
    }

    #[tokio::test]
    async fn test_static_files_served_first() {
        let site = Site::new();
        site.write("static/style.css", "body {}")
            .write("pages/style.css.json", r#"{"path": "/style.css", "view": "echo"}"#)
            .write("pages/about.json", r#"{"view": "echo"}"#);

        assert_eq!(
            get(site.router(), "/style.css").await,
            (StatusCode::OK, "body {}".to_owned())
        );
        assert_eq!(get(site.router(), "/about").await.0, StatusCode::OK);
        assert_eq!(get(site.router(), "/nope").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_swapping_site_changes_future_requests() {
        let site = Site::new();
        site.write("pages/a.json", r#"{"view": "echo"}"#);
        let handle = site.handle();
        let router = create_router(Arc::clone(&handle), None);

        assert_eq!(get(router.clone(), "/b").await.0, StatusCode::NOT_FOUND);
        let before = handle.load_full();

        site.write("pages/b.json", r#"{"view": "echo"}"#);
        handle.store(Arc::new(site.builder().build()));

        assert_eq!(get(router.clone(), "/b").await.0, StatusCode::OK);
        assert_eq!(before.routes().len(), 1);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_redirect_never_resolves_a_view() {
        let site = Site::new();
        site.write(
            "pages/old.json",
            r#"{"redirect": "/new", "view": "does-not-exist"}"#,
        )
        .write("pages/plain.json", r#"{"redirect": "/elsewhere"}"#)
        .write("pages/broken.json", r#"{"view": "does-not-exist"}"#);

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let compiled = tracing::subscriber::with_default(subscriber, || site.builder().build());

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(compiled.routes().len(), 2);
        assert_eq!(logs.matches("No view for page").count(), 1);
        assert!(logs.contains("broken.json"));
        assert!(!logs.contains("old.json"));
        assert!(!logs.contains("plain.json"));
    }
}
