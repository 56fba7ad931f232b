//! Config command implementation

use super::ConfigArgs;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: ShowConfigArgs) -> Result<()> {
    let config = args.config.load()?;
    let text = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    print!("{}", text);
    Ok(())
}
