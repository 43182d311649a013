//! Site configuration management for `vela.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                      |
//! |-------------|----------------------------------------------|
//! | `[base]`    | Site metadata (title, author, url)           |
//! | `[build]`   | Source/template/component/output paths       |
//! | `[serve]`   | Development server (port, interface, watch)  |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//! description = "A personal blog"
//! url = "https://example.com"
//!
//! [build]
//! src = "src"
//! output = "public"
//!
//! [serve]
//! port = 8080
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

// Internal imports used in this module
use base::BaseConfig;
use build::BuildConfig;
use error::ConfigError;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing vela.toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let config =
            toml::from_str(&content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Base URL with a guaranteed trailing slash, for canonical URL assembly.
    pub fn base_url(&self) -> String {
        let url = self.base.url.as_deref().unwrap_or_default();
        if url.ends_with('/') {
            url.to_owned()
        } else {
            format!("{url}/")
        }
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        let root = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root, cli);

        let build_args = cli.build_args();
        Self::update_option(&mut self.build.drafts, build_args.drafts.as_ref());
        if let Some(url) = &build_args.base_url {
            self.base.url = Some(url.clone());
        }

        if let Commands::Serve {
            interface,
            port,
            watch,
            ..
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
            self.serve.live_reload = true;
            // An explicit --base-url wins over the local serve address.
            if build_args.base_url.is_none() {
                self.base.url = Some(format!(
                    "http://{}:{}",
                    self.serve.interface, self.serve.port
                ));
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, cli: &Cli) {
        let root = Self::normalize_path(root);

        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.build.src = Self::normalize_path(&root.join(&self.build.src));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.templates = Self::normalize_path(&root.join(&self.build.templates));
        self.build.components = Self::normalize_path(&root.join(&self.build.components));

        self.set_root(&root);
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        if !self.config_path.exists() {
            bail!("Config file not found");
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.renderer_command.is_empty() {
            bail!(ConfigError::Validation(
                "[build.renderer_command] must have at least one element".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let config_str = r#"
            [base]
            title = "My Blog"
            description = "A test blog"
            author = "Test Author"
        "#;
        let result = SiteConfig::from_str(config_str);

        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.base.title, "My Blog");
        assert_eq!(config.base.author, "Test Author");
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let invalid_config = r#"
            [base
            title = "My Blog"
        "#;
        let result = SiteConfig::from_str(invalid_config);

        assert!(result.is_err());
    }

    #[test]
    fn test_get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_set_root() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/custom/path"));
        assert_eq!(config.get_root(), Path::new("/custom/path"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://example.com".to_string());
        assert_eq!(config.base_url(), "https://example.com/");

        config.base.url = Some("https://example.com/".to_string());
        assert_eq!(config.base_url(), "https://example.com/");
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();

        assert!(config.cli.is_none());
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.base.title, "");
        assert!(!config.build.drafts);
        assert_eq!(config.serve.port, 8080);
    }

    #[test]
    fn test_full_config_all_sections() {
        let config = r#"
            [base]
            title = "My Blog"
            description = "A personal blog"
            author = "Alice"
            url = "https://myblog.com"
            language = "en-US"

            [build]
            src = "pages"
            output = "dist"
            drafts = true
            renderer_command = ["pandoc", "--mathml"]

            [serve]
            interface = "127.0.0.1"
            port = 3000
            watch = true
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "My Blog");
        assert_eq!(config.base.author, "Alice");
        assert_eq!(config.build.src, PathBuf::from("pages"));
        assert!(config.build.drafts);
        assert_eq!(config.build.renderer_command, vec!["pandoc", "--mathml"]);
        assert_eq!(config.serve.port, 3000);
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test"

            [unknown_section]
            field = "value"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_default_local_base_url() {
        use clap::Parser;
        let cli: &'static Cli = Box::leak(Box::new(Cli::parse_from(["vela", "serve"])));
        let mut config = SiteConfig::default();
        config.update_with_cli(cli);

        assert_eq!(config.base.url, Some("http://127.0.0.1:8080".to_string()));
        assert!(config.serve.live_reload);
    }

    #[test]
    fn test_serve_explicit_base_url_not_overwritten() {
        use clap::Parser;
        let cli: &'static Cli = Box::leak(Box::new(Cli::parse_from([
            "vela",
            "serve",
            "--base-url",
            "https://staging.example.com",
        ])));
        let mut config = SiteConfig::default();
        config.update_with_cli(cli);

        assert_eq!(
            config.base.url,
            Some("https://staging.example.com".to_string())
        );
    }

    #[test]
    fn test_validate_bad_base_url() {
        let mut config = SiteConfig::default();
        config.config_path = std::env::temp_dir();
        config.base.url = Some("example.com".to_string());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_renderer_command() {
        let mut config = SiteConfig::default();
        config.config_path = std::env::temp_dir();
        config.build.renderer_command = vec![];

        assert!(config.validate().is_err());
    }
}
