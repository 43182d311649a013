//! Sitemap generation.
//!
//! Writes a sitemap.xml listing every indexable page for search engines.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!   </url>
//! </urlset>
//! ```

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result};
use std::fs;

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Public API
// ============================================================================

/// Write sitemap.xml at the output root.
///
/// Takes the canonical URLs collected during the build, in discovery
/// order; pages excluded from indexing never reach this list.
pub fn write_sitemap(config: &SiteConfig, urls: &[String]) -> Result<()> {
    let sitemap_path = config.build.output.join("sitemap.xml");
    let xml = sitemap_xml(urls);

    fs::write(&sitemap_path, xml)
        .with_context(|| format!("Failed to write sitemap to {}", sitemap_path.display()))?;

    log!("sitemap"; "{} ({} urls)", sitemap_path.file_name().unwrap_or_default().to_string_lossy(), urls.len());
    Ok(())
}

// ============================================================================
// XML Assembly
// ============================================================================

/// Generate sitemap XML string.
fn sitemap_xml(urls: &[String]) -> String {
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for url in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(url)));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
