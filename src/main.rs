//! Vela - a static site generator for component-templated HTML and Markdown.

mod cli;
mod config;
mod engine;
mod error;
mod frontmatter;
mod generator;
mod logger;
mod pipeline;
mod serve;
mod watch;

use anyhow::{Result, bail};
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use pipeline::build_site;
use serve::serve_site;
use std::path::Path;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(load_config(cli)?));

    if cli.is_serve() {
        // The first build happens before serving begins; a broken site is a
        // startup error, not something to discover in the browser.
        build_site(config)?;
        serve_site(config)
    } else {
        build_site(config).map(|_| ())
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    if !config_path.exists() {
        bail!("Config file not found: {}", config_path.display());
    }

    let mut config = SiteConfig::from_path(&config_path)?;
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}
