//! `quire routes` command implementation.

use std::path::Path;

use clap::Args;
use quire_config::CliSettings;
use quire_server::{CompiledSite, RouteHandler, server_config_from_quire_config};

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the routes command.
#[derive(Args, Debug)]
pub(crate) struct RoutesArgs {
    #[command(flatten)]
    site: SiteArgs,

    /// Enable verbose output (show skipped pages and views).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RoutesArgs {
    /// Build the site once and print its route table in match order.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.site.load(CliSettings::default())?;

        let server_config = server_config_from_quire_config(&config);
        let site = server_config.site_builder().build();

        let rows = route_rows(&site, &server_config.pages_dir);
        let width = rows.iter().map(|(pattern, _, _)| pattern.len()).max().unwrap_or(0);
        for (pattern, target, file) in &rows {
            output.line(&format!(
                "{pattern:<width$}  {target}  {}",
                output.dim(file)
            ));
        }

        let skipped = site.pages().len() - site.routes().len();
        output.info(&format!("{} routes, {} pages", rows.len(), site.pages().len()));
        if skipped > 0 {
            output.warning(&format!(
                "{skipped} page(s) without a route, run with --verbose for details"
            ));
        }
        Ok(())
    }
}

/// `(pattern, target, file)` per route, in registration order.
fn route_rows(site: &CompiledSite, pages_dir: &Path) -> Vec<(String, String, String)> {
    let pages_dir = std::path::absolute(pages_dir).unwrap_or_else(|_| pages_dir.to_path_buf());
    site.routes()
        .iter()
        .map(|route| {
            let page = site.page(route);
            let target = match route.handler() {
                RouteHandler::Redirect { location, status } => format!(
                    "-> {} ({})",
                    location.to_str().unwrap_or("<binary>"),
                    status.as_u16()
                ),
                RouteHandler::View { .. } => route.handler().kind().to_owned(),
            };
            let file = page.file.strip_prefix(&pages_dir).unwrap_or(page.file.as_path());
            (route.pattern().to_string(), target, file.display().to_string())
        })
        .collect()
}
