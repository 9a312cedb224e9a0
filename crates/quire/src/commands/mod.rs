//! CLI command implementations.

pub(crate) mod routes;
pub(crate) mod serve;

use std::path::PathBuf;

use clap::Args;
use quire_config::{CliSettings, Config};

use crate::error::CliError;

pub(crate) use routes::RoutesArgs;
pub(crate) use serve::ServeArgs;

/// Site location arguments shared by all commands.
#[derive(Args, Debug, Default)]
pub(crate) struct SiteArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Page descriptors directory (overrides config).
    #[arg(long)]
    pages_dir: Option<PathBuf>,

    /// Views directory (overrides config).
    #[arg(long)]
    views_dir: Option<PathBuf>,

    /// Static files directory (overrides config).
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

impl SiteArgs {
    /// Load the configuration with these arguments and `settings` applied.
    pub(crate) fn load(self, settings: CliSettings) -> Result<Config, CliError> {
        let settings = CliSettings {
            pages_dir: self.pages_dir,
            views_dir: self.views_dir,
            static_dir: self.static_dir,
            ..settings
        };
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        tracing::debug!(
            config = ?config.config_path,
            root = %config.root_dir.display(),
            "Configuration loaded"
        );
        Ok(config)
    }
}
