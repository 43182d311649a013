//! Canonical URLs and per-page meta tags.
//!
//! A page's canonical URL is its output path with the `.html` suffix
//! stripped, or with a trailing `/index.html` stripped to the directory
//! path. It is used for sitemap entries, feed links and the
//! canonical/OpenGraph meta tags.

use crate::config::SiteConfig;
use regex::Regex;
use std::{
    path::Path,
    sync::LazyLock,
};

// ============================================================================
// Canonical URLs
// ============================================================================

/// Canonical path of an output file, relative to the site root.
///
/// `public/blog/index.html` → `blog/`, `public/about.html` → `about`,
/// `public/index.html` → ``.
pub fn canonical_rel_path(output_file: &Path, config: &SiteConfig) -> String {
    let rel = output_file
        .strip_prefix(&config.build.output)
        .unwrap_or(output_file);
    let rel = rel.to_string_lossy().replace('\\', "/");

    if let Some(dir) = rel.strip_suffix("index.html") {
        dir.to_owned()
    } else {
        rel.strip_suffix(".html").unwrap_or(&rel).to_owned()
    }
}

/// Full canonical URL of an output file.
pub fn page_url(output_file: &Path, config: &SiteConfig) -> String {
    format!("{}{}", config.base_url(), canonical_rel_path(output_file, config))
}

/// URL directory path of an index page (`/blog/` for
/// `public/blog/index.html`), used for root-relative link rewriting.
pub fn page_dir_path(output_file: &Path, config: &SiteConfig) -> String {
    format!("/{}", canonical_rel_path(output_file, config))
}

// ============================================================================
// Link Rewriting
// ============================================================================

static RE_DOT_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="\./"#).unwrap());

/// Rewrite `href="./..."` links inside an index page so they resolve
/// against the page's actual directory rather than wherever the page is
/// viewed from.
pub fn rewrite_relative_hrefs(html: &str, dir_path: &str) -> String {
    let replacement = format!(r#"href="{dir_path}"#);
    RE_DOT_HREF.replace_all(html, replacement.as_str()).into_owned()
}

// ============================================================================
// Meta Tags
// ============================================================================

/// Assemble the per-page meta-tag block.
///
/// A page whose `desc` is the literal `no-index` gets only a robots
/// noindex tag and must be left out of the sitemap by the caller. All
/// other pages get OpenGraph title, description, and a canonical
/// link/og:url pair.
pub fn build_meta_tags(title: &str, desc: &str, url: &str, noindex: bool) -> String {
    if noindex {
        return r#"<meta name="robots" content="noindex">"#.to_owned();
    }

    let title = escape_attr(title);
    let desc = escape_attr(desc);
    let url = escape_attr(url);

    format!(
        "<meta property=\"og:title\" content=\"{title}\">\n\
         <meta name=\"description\" content=\"{desc}\">\n\
         <link rel=\"canonical\" href=\"{url}\">\n\
         <meta property=\"og:url\" content=\"{url}\">"
    )
}

/// Escape special characters for HTML attribute values.
fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_with(output: &str, url: &str) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.output = PathBuf::from(output);
        config.base.url = Some(url.to_string());
        config
    }

    #[test]
    fn test_canonical_index_page() {
        let config = config_with("public", "https://example.com");
        let url = page_url(Path::new("public/blog/index.html"), &config);
        assert_eq!(url, "https://example.com/blog/");
    }

    #[test]
    fn test_canonical_plain_page() {
        let config = config_with("public", "https://example.com");
        let url = page_url(Path::new("public/about.html"), &config);
        assert_eq!(url, "https://example.com/about");
    }

    #[test]
    fn test_canonical_root_index() {
        let config = config_with("public", "https://example.com");
        let url = page_url(Path::new("public/index.html"), &config);
        assert_eq!(url, "https://example.com/");
    }

    #[test]
    fn test_page_dir_path() {
        let config = config_with("public", "https://example.com");
        assert_eq!(
            page_dir_path(Path::new("public/blog/index.html"), &config),
            "/blog/"
        );
        assert_eq!(page_dir_path(Path::new("public/index.html"), &config), "/");
    }

    #[test]
    fn test_rewrite_relative_hrefs() {
        let html = r#"<a href="./post">x</a> <a href="/abs">y</a>"#;
        let out = rewrite_relative_hrefs(html, "/blog/");
        assert_eq!(out, r#"<a href="/blog/post">x</a> <a href="/abs">y</a>"#);
    }

    #[test]
    fn test_meta_tags_normal() {
        let tags = build_meta_tags("Title", "Desc", "https://example.com/about", false);
        assert!(tags.contains(r#"<meta property="og:title" content="Title">"#));
        assert!(tags.contains(r#"<meta name="description" content="Desc">"#));
        assert!(tags.contains(r#"<link rel="canonical" href="https://example.com/about">"#));
        assert!(tags.contains(r#"<meta property="og:url" content="https://example.com/about">"#));
        assert!(!tags.contains("noindex"));
    }

    #[test]
    fn test_meta_tags_noindex() {
        let tags = build_meta_tags("Title", "no-index", "https://example.com/x", true);
        assert_eq!(tags, r#"<meta name="robots" content="noindex">"#);
        assert!(!tags.contains("canonical"));
    }

    #[test]
    fn test_meta_tags_escaping() {
        let tags = build_meta_tags(r#"A "quoted" <title>"#, "", "https://e.com/", false);
        assert!(tags.contains("A &quot;quoted&quot; &lt;title&gt;"));
    }
}
