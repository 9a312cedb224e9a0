//! `quire serve` command implementation.

use clap::Args;
use quire_config::CliSettings;
use quire_server::{run_server, server_config_from_quire_config};

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    site: SiteArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Rebuild the site when files change.
    #[arg(long)]
    watch: bool,

    /// Never rebuild, even if enabled in config.
    #[arg(long, conflicts_with = "watch")]
    no_watch: bool,

    /// Enable verbose output (build and request logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            watch_enabled: resolve_watch(self.watch, self.no_watch),
            ..CliSettings::default()
        };
        let config = self.site.load(cli_settings)?;
        let site = &config.site_resolved;

        output.highlight(&format!(
            "Serving on http://{}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!("Pages: {}", site.pages_dir.display()));
        output.info(&format!("Views: {}", site.views_dir.display()));
        if site.static_dir.is_dir() {
            output.info(&format!("Static: {}", site.static_dir.display()));
        } else {
            output.info("Static: none");
        }
        if !site.pages_dir.is_dir() {
            output.warning(&format!(
                "Pages directory {} does not exist, every request will be 404",
                site.pages_dir.display()
            ));
        }
        if config.watch.enabled {
            output.info(&format!("Watch: enabled ({}ms)", config.watch.debounce_ms));
        } else {
            output.info("Watch: disabled");
        }

        let server_config = server_config_from_quire_config(&config);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}

/// Resolve the watch override from `--watch`/`--no-watch`.
fn resolve_watch(watch: bool, no_watch: bool) -> Option<bool> {
    no_watch.then_some(false).or(watch.then_some(true))
}
