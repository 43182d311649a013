//! Markdown rendering with batched fan-out.
//!
//! Every job carries its own body text and renderer choice. External
//! renderer subprocesses are all spawned before any is awaited, then the
//! results are joined in submission order (never completion order), so
//! sitemap and feed entries stay deterministic no matter how the
//! processes finish. Embedded jobs go through pulldown-cmark in-process.
//!
//! There is no timeout: a hung external renderer blocks the whole build.

use crate::error::BuildError;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

// ============================================================================
// Renderer Selection
// ============================================================================

/// Which renderer converts a job's Markdown body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// External `pandoc` subprocess.
    Pandoc,
    /// In-process pulldown-cmark.
    Embedded,
}

impl RendererKind {
    /// Choose per-job from the frontmatter `renderer` key. Anything other
    /// than the literal `pandoc` uses the embedded renderer.
    pub fn from_frontmatter(value: Option<&str>) -> Self {
        match value {
            Some("pandoc") => Self::Pandoc,
            _ => Self::Embedded,
        }
    }
}

/// A unit of rendering work: source path (for error reporting) plus the
/// Markdown body with the frontmatter already stripped.
#[derive(Debug)]
pub struct RenderRequest {
    pub source: PathBuf,
    pub body: String,
    pub renderer: RendererKind,
}

// ============================================================================
// Fan-out / Fan-in
// ============================================================================

/// Render every request, returning HTML bodies in submission order.
///
/// External processes are started eagerly (fan-out bounded only by the
/// number of jobs), embedded jobs render on the rayon pool, and results
/// are keyed by the originating job index.
pub fn render_all(requests: &[RenderRequest], command: &[String]) -> Result<Vec<String>> {
    if requests.iter().any(|r| r.renderer == RendererKind::Pandoc) {
        let binary = command.first().context("renderer command is empty")?;
        which::which(binary).map_err(|_| BuildError::Renderer {
            source_file: PathBuf::from(binary),
            detail: format!("`{binary}` not found, install it or drop `renderer: pandoc`"),
        })?;
    }

    // Start every subprocess before awaiting any of them.
    let mut children: Vec<Option<Child>> = Vec::with_capacity(requests.len());
    for request in requests {
        match request.renderer {
            RendererKind::Pandoc => match spawn_renderer(request, command) {
                Ok(child) => children.push(Some(child)),
                Err(e) => {
                    reap(children);
                    return Err(e);
                }
            },
            RendererKind::Embedded => children.push(None),
        }
    }

    // Embedded conversions run on the thread pool meanwhile, keyed by index.
    let embedded: HashMap<usize, String> = requests
        .par_iter()
        .enumerate()
        .filter(|(_, r)| r.renderer == RendererKind::Embedded)
        .map(|(i, r)| (i, render_markdown(&r.body)))
        .collect();

    // Join in submission order. On failure the remaining children are
    // still waited on, so a failed build leaves no zombies behind.
    let mut results = Vec::with_capacity(requests.len());
    let mut pending = requests.iter().zip(children).enumerate();
    while let Some((i, (request, child))) = pending.next() {
        let html = match child {
            Some(child) => match collect_renderer_output(child, &request.source) {
                Ok(html) => html,
                Err(e) => {
                    reap(pending.map(|(_, (_, child))| child));
                    return Err(e);
                }
            },
            None => embedded[&i].clone(),
        };
        results.push(html);
    }

    Ok(results)
}

/// Wait on leftover renderer children after a failure.
fn reap(children: impl IntoIterator<Item = Option<Child>>) {
    for child in children.into_iter().flatten() {
        child.wait_with_output().ok();
    }
}

/// Spawn one external renderer and feed it the Markdown body on stdin.
///
/// The body is written from a helper thread: a renderer that streams
/// output while still reading input would otherwise fill the stdout pipe
/// and deadlock against the blocked stdin write on large documents. A
/// failed write surfaces through the renderer's exit status.
fn spawn_renderer(request: &RenderRequest, command: &[String]) -> Result<Child> {
    let renderer_error = |detail: String| BuildError::Renderer {
        source_file: request.source.clone(),
        detail,
    };

    let mut child = Command::new(&command[0])
        .args(&command[1..])
        .args(["-f", "markdown", "-t", "html"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| renderer_error(format!("failed to spawn: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| renderer_error("failed to acquire stdin".into()))?;
    let body = request.body.clone();
    std::thread::spawn(move || {
        // Dropping stdin after the write closes the pipe and signals EOF.
        stdin.write_all(body.as_bytes()).ok();
    });

    Ok(child)
}

/// Await one external renderer and return its HTML output.
fn collect_renderer_output(child: Child, source: &Path) -> Result<String> {
    let output = child.wait_with_output().map_err(|e| BuildError::Renderer {
        source_file: source.to_path_buf(),
        detail: format!("failed to collect output: {e}"),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(BuildError::Renderer {
            source_file: source.to_path_buf(),
            detail: format!("{} ({})", output.status, stderr.trim()),
        });
    }

    String::from_utf8(output.stdout)
        .with_context(|| format!("renderer emitted invalid UTF-8 for {}", source.display()))
}

// ============================================================================
// Embedded Renderer
// ============================================================================

/// Convert Markdown to HTML in-process.
pub fn render_markdown(body: &str) -> String {
    let mut options = pulldown_cmark::Options::empty();
    options.insert(pulldown_cmark::Options::ENABLE_TABLES);
    options.insert(pulldown_cmark::Options::ENABLE_FOOTNOTES);
    options.insert(pulldown_cmark::Options::ENABLE_STRIKETHROUGH);
    options.insert(pulldown_cmark::Options::ENABLE_TASKLISTS);

    let parser = pulldown_cmark::Parser::new_ext(body, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_kind_selection() {
        assert_eq!(
            RendererKind::from_frontmatter(Some("pandoc")),
            RendererKind::Pandoc
        );
        assert_eq!(
            RendererKind::from_frontmatter(Some("markdown")),
            RendererKind::Embedded
        );
        assert_eq!(RendererKind::from_frontmatter(None), RendererKind::Embedded);
    }

    #[test]
    fn test_render_markdown_basic() {
        let html = render_markdown("# Title\n\nsome *text*");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn test_render_markdown_table_extension() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_render_all_embedded_order() {
        let requests: Vec<RenderRequest> = ["# one", "# two", "# three"]
            .iter()
            .enumerate()
            .map(|(i, body)| RenderRequest {
                source: PathBuf::from(format!("{i}.md")),
                body: (*body).to_string(),
                renderer: RendererKind::Embedded,
            })
            .collect();

        let results = render_all(&requests, &["pandoc".to_string()]).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].contains("one"));
        assert!(results[1].contains("two"));
        assert!(results[2].contains("three"));
    }

    #[test]
    fn test_render_all_empty() {
        let results = render_all(&[], &["pandoc".to_string()]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_failing_renderer_reaps_remaining_children() {
        let requests: Vec<RenderRequest> = (0..3)
            .map(|i| RenderRequest {
                source: PathBuf::from(format!("{i}.md")),
                body: "# x".into(),
                renderer: RendererKind::Pandoc,
            })
            .collect();
        // Consumes stdin, then fails; the two later children must still be
        // waited on after the first error aborts the join.
        let cmd: Vec<String> = ["sh", "-c", "cat >/dev/null; exit 1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let err = render_all(&requests, &cmd).unwrap_err();
        assert!(format!("{err}").contains("0.md"));
    }

    #[test]
    fn test_streaming_renderer_large_body() {
        // A renderer that echoes while reading must not deadlock against
        // the stdin write once the body exceeds the pipe buffer.
        let body = "y".repeat(1 << 20);
        let requests = vec![RenderRequest {
            source: PathBuf::from("big.md"),
            body: body.clone(),
            renderer: RendererKind::Pandoc,
        }];
        let cmd: Vec<String> = ["sh", "-c", "cat"].iter().map(|s| s.to_string()).collect();

        let results = render_all(&requests, &cmd).unwrap();
        assert_eq!(results[0], body);
    }

    #[test]
    fn test_missing_renderer_binary() {
        let requests = vec![RenderRequest {
            source: PathBuf::from("a.md"),
            body: "# x".into(),
            renderer: RendererKind::Pandoc,
        }];
        let err = render_all(&requests, &["vela-no-such-renderer".to_string()]).unwrap_err();
        assert!(format!("{err}").contains("not found"));
    }
}
