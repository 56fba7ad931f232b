//! Subcommand implementations

pub mod list;
pub mod measure;
pub mod parse;
pub mod show_config;
pub mod summary;

use anyhow::{Context, Result};
use clap::Args;
use kerntime_collector::Config;
use std::path::PathBuf;

/// Options shared by every command that needs a configuration
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Configuration file (defaults to ./kerntime.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Common root directory of the suites
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Suite to measure; repeat for several suites
    #[arg(short, long = "suite")]
    pub suites: Vec<String>,
}

impl ConfigArgs {
    /// Load the configuration and apply command-line overrides
    pub fn load(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).with_context(|| match &self.config {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to load configuration".to_string(),
        })?;

        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if !self.suites.is_empty() {
            config.suites = self.suites.clone();
        }
        Ok(config)
    }
}
