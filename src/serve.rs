//! Development server.
//!
//! A lightweight HTTP server over the build output directory, built on
//! `tiny_http`:
//!
//! - Static file serving from `build.output`
//! - Automatic `index.html` resolution for `/` and directories
//! - Content sniffing for extensionless clean-URL pages
//! - File watching and auto-rebuild (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! Not a production server: single-threaded request handling, no
//! caching headers, loopback use only.

use crate::{config::SiteConfig, log, watch::watch_for_changes_blocking};
use anyhow::{Context, Result};
use std::{
    fs,
    io::Cursor,
    net::SocketAddr,
    path::{Component, Path},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

// ============================================================================
// Constants
// ============================================================================

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the development server with optional file watching.
///
/// Binds the configured interface and port (with auto-retry on port
/// conflict), installs a Ctrl+C handler, spawns the watcher thread if
/// enabled, then blocks in the request loop until shutdown.
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let interface: std::net::IpAddr = config.serve.interface.parse()?;
    let base_port = config.serve.port;

    let (server, addr) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    if config.serve.watch {
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(config) {
                log!("watch"; "{err}");
            }
        });
    }

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, config) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => {
                continue;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
///
/// Resolution order:
/// 1. Path escaping the output root → 403
/// 2. Exact file match → serve file
/// 3. Directory with index.html → serve index.html
/// 4. Nothing found → 404
fn handle_request(request: Request, config: &SiteConfig) -> Result<()> {
    let serve_root = &config.build.output;

    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g., ?t=123456) before resolving path
    let path_without_query = url_path.split('?').next().unwrap_or(&url_path);
    let request_path = path_without_query.trim_matches('/');

    if has_parent_traversal(request_path) {
        return serve_forbidden(request);
    }

    let local_path = serve_root.join(request_path);

    if local_path.is_file() {
        return serve_file(request, &local_path);
    }

    // "/" and any other directory resolve to their index.html
    if local_path.is_dir() {
        let index_path = local_path.join("index.html");
        if index_path.is_file() {
            return serve_file(request, &index_path);
        }
    }

    serve_not_found(request)
}

/// Reject any request path with a `..` segment before it touches the
/// filesystem.
fn has_parent_traversal(request_path: &str) -> bool {
    Path::new(request_path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content_type = guess_content_type(path, &content);

    let response = Response::from_data(content)
        .with_header(Header::from_bytes("Content-Type", content_type).unwrap());

    request.respond(response)?;
    Ok(())
}

/// Serve 403 Forbidden response.
fn serve_forbidden(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(403),
        vec![Header::from_bytes("Content-Type", "text/plain").unwrap()],
        Cursor::new("403 Forbidden"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![Header::from_bytes("Content-Type", "text/plain").unwrap()],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Extensionless files get a peek at their content: clean-URL pages are
/// HTML files renamed without the extension, so a leading `<` means
/// text/html.
fn guess_content_type(path: &Path, content: &[u8]) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        None if content.trim_ascii_start().starts_with(b"<") => "text/html; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_guess_content_type_by_extension() {
        assert_eq!(
            guess_content_type(&PathBuf::from("a.html"), b""),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            guess_content_type(&PathBuf::from("a.css"), b""),
            "text/css; charset=utf-8"
        );
        assert_eq!(guess_content_type(&PathBuf::from("a.png"), b""), "image/png");
        assert_eq!(
            guess_content_type(&PathBuf::from("a.unknown"), b"<html>"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_guess_content_type_extensionless_sniffing() {
        assert_eq!(
            guess_content_type(&PathBuf::from("about"), b"<!doctype html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            guess_content_type(&PathBuf::from("about"), b"  \n<html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            guess_content_type(&PathBuf::from("blob"), b"\x89PNG"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_parent_traversal_detection() {
        assert!(has_parent_traversal("../etc/passwd"));
        assert!(has_parent_traversal("a/../../b"));
        assert!(!has_parent_traversal("a/b/c.html"));
        assert!(!has_parent_traversal(""));
        // A dot segment or dotted name is not traversal.
        assert!(!has_parent_traversal("./a"));
        assert!(!has_parent_traversal("a/..b/c"));
    }
}
