//! `[build]` section configuration.
//!
//! Contains build paths and conversion settings.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[build]` section in vela.toml - build paths and conversion settings.
///
/// # Example
/// ```toml
/// [build]
/// src = "src"
/// templates = "templates"
/// components = "components"
/// output = "public"
/// drafts = false
/// renderer_command = ["pandoc"]
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (set from CLI, not from file).
    #[serde(skip)]
    pub root: Option<PathBuf>,

    /// Page sources (HTML and Markdown), copied verbatim into the output
    /// tree before transformation.
    #[serde(default = "defaults::build::src")]
    #[educe(Default = defaults::build::src())]
    pub src: PathBuf,

    /// Flat directory of page-template files keyed by file name.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Flat directory of component files keyed by file name.
    #[serde(default = "defaults::build::components")]
    #[educe(Default = defaults::build::components())]
    pub components: PathBuf,

    /// Output directory for the generated site.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Build pages whose frontmatter says `draft: true`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// External renderer invocation for pages with `renderer: pandoc`.
    /// First element is the binary, the rest are extra arguments.
    #[serde(default = "defaults::build::renderer_command")]
    #[educe(Default = defaults::build::renderer_command())]
    pub renderer_command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test blog"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.src, PathBuf::from("src"));
        assert_eq!(config.build.templates, PathBuf::from("templates"));
        assert_eq!(config.build.components, PathBuf::from("components"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(!config.build.drafts);
        assert_eq!(config.build.renderer_command, vec!["pandoc"]);
    }

    #[test]
    fn test_build_config_override() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test blog"

            [build]
            src = "pages"
            output = "dist"
            renderer_command = ["pandoc", "--no-highlight"]
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.src, PathBuf::from("pages"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(
            config.build.renderer_command,
            vec!["pandoc", "--no-highlight"]
        );
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [base]
            title = "Test"
            description = "Test blog"

            [build]
            unknown_field = "should_fail"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
    }
}
