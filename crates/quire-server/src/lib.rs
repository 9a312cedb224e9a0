//! HTTP serving for quire sites.
//!
//! Compiles the page index into an ordered route table and serves it with
//! axum:
//!
//! - Static files (tower-http `ServeDir`) are tried first
//! - Remaining GET/HEAD requests go through the route table, first match wins
//! - In watch mode the whole site is rebuilt on change and swapped in
//!   atomically
//!
//! # Quick Start
//!
//! ```ignore
//! use quire_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         port: 8080,
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! pages/ ──► PageList ──► compile_routes ──► CompiledSite ──► SiteHandle (ArcSwap)
//!                                                                  │
//! Browser ──HTTP──► ServeDir(static/) ──fallback──► dispatch ◄─────┘
//!                                                     │
//!                                                     └─► View ──► Render
//! ```

mod app;
mod compiler;
mod error;
mod pattern;
mod render;
mod site;
mod watch;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub use app::{SiteHandle, create_router, site_handle};
pub use compiler::{Route, RouteHandler, compile, compile_routes};
pub use error::ServerError;
pub use pattern::{PatternError, RoutePattern, WILDCARD_PARAM};
pub use render::{HtmlRender, Render};
pub use site::{CompiledSite, SiteBuilder};
pub use watch::{SiteWatcher, WatchOptions, watch};

use quire_views::ViewRegistry;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Page descriptors directory.
    pub pages_dir: PathBuf,
    /// Views directory.
    pub views_dir: PathBuf,
    /// Static files directory, served only if it exists.
    pub static_dir: PathBuf,
    /// Native views.
    pub views: ViewRegistry,
    /// Rebuild on change (`None` disables watching).
    pub watch: Option<WatchOptions>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            pages_dir: PathBuf::from("pages"),
            views_dir: PathBuf::from("views"),
            static_dir: PathBuf::from("static"),
            views: ViewRegistry::new(),
            watch: None,
        }
    }
}

impl ServerConfig {
    /// Builder for this configuration's site.
    pub fn site_builder(&self) -> SiteBuilder {
        SiteBuilder::new(&self.pages_dir, &self.views_dir).with_views(self.views.clone())
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid, the port cannot be bound, or
/// the watcher cannot start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let builder = config.site_builder();
    let handle = site_handle(builder.clone().build());

    let _watcher = match &config.watch {
        Some(options) => Some(watch(builder, Arc::clone(&handle), options.clone())?),
        None => None,
    };

    let app = create_router(handle, Some(config.static_dir.as_path()));

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C, shutdown only by signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from quire config.
#[must_use]
pub fn server_config_from_quire_config(config: &quire_config::Config) -> ServerConfig {
    let site = &config.site_resolved;
    let watch = config.watch.enabled.then(|| WatchOptions {
        root: config.root_dir.clone(),
        debounce: Duration::from_millis(config.watch.debounce_ms),
        ignore: config.watch.ignore.clone(),
    });

    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        pages_dir: site.pages_dir.clone(),
        views_dir: site.views_dir.clone(),
        static_dir: site.static_dir.clone(),
        views: ViewRegistry::new(),
        watch,
    }
}
