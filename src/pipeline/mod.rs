//! Conversion pipeline: source tree in, deployable site out.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── copy src/ → staging tree (verbatim working copy)
//!     ├── SiteCaches::load()          templates/ + components/
//!     ├── find_feed_dirs()            index.md with `type: feed`
//!     ├── collect_jobs()              one ConversionJob per .md survivor
//!     ├── render_all()                fan-out renderers, join in order
//!     ├── post_process()              template + meta tags per job
//!     ├── write_feeds()               RSS per feed directory
//!     ├── process_static_pages()      component pass over .html files
//!     ├── write_sitemap()             accumulated URLs, discovery order
//!     └── swap staging → public/     (only on success)
//! ```
//!
//! Every build re-scans and reconverts everything; caches and URL
//! accumulators live for exactly one invocation. The previously
//! published tree is replaced only after a complete successful build, so
//! the dev server keeps serving it through (and despite) a failed
//! rebuild.

pub mod meta;
pub mod render;

use crate::{
    config::SiteConfig,
    engine::{SiteCaches, TemplateContext, expand_components, render_template},
    error::BuildError,
    frontmatter::{Frontmatter, parse_frontmatter},
    generator::{rss::write_feeds, sitemap::write_sitemap},
    log,
};
use anyhow::{Context, Result, bail};
use render::{RenderRequest, RendererKind, render_all};
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use walkdir::WalkDir;

/// Script injected through the `Reload` context key when serving.
const RELOAD_SNIPPET: &str = include_str!("../embed/reload.html");

/// File extensions never touched by the static pass.
const IMAGE_EXTENSIONS: &[&str] = &["avif", "webp", "png", "jpeg", "jpg", "svg"];

// ============================================================================
// Data Model
// ============================================================================

/// One Markdown file to convert. Created during the tree walk, immutable
/// afterwards, owned by a single build invocation.
#[derive(Debug)]
pub struct ConversionJob {
    /// The copied `.md` file inside the output tree.
    pub source: PathBuf,
    /// The `.html` file that replaces it.
    pub output: PathBuf,
    /// Source path as the user knows it, for error messages.
    pub label: String,
    pub frontmatter: Frontmatter,
    /// Markdown body, taken out of the job when rendering starts.
    body: String,
    pub renderer: RendererKind,
    pub is_feed_member: bool,
    pub feed_dir: Option<PathBuf>,
}

/// Ordered, deduplicated canonical URL accumulator for the sitemap.
#[derive(Debug, Default)]
pub struct UrlSet {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl UrlSet {
    /// Record a URL; at most once per page.
    pub fn push(&mut self, url: String) {
        if self.seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }
}

// ============================================================================
// Build Entry Point
// ============================================================================

/// Run the full source → site transform.
///
/// The site is assembled in a hidden staging directory next to the
/// output and swapped in only once the build has fully succeeded; a
/// failed build never touches the previously published tree.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;
    let staging = output.with_file_name(staging_name(output));

    let mut staged = config.clone();
    staged.build.output = staging.clone();

    if let Err(e) = build_into(&staged) {
        fs::remove_dir_all(&staging).ok();
        return Err(e);
    }

    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::rename(&staging, output)
        .with_context(|| format!("Failed to publish staged build to {}", output.display()))?;
    Ok(())
}

/// `public` → `.public.staging`, always a sibling of the output.
fn staging_name(output: &Path) -> String {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "public".to_owned());
    format!(".{name}.staging")
}

/// Assemble the site into the configured output directory.
fn build_into(config: &SiteConfig) -> Result<()> {
    let started = Instant::now();
    let src = &config.build.src;
    let output = &config.build.output;

    if !src.is_dir() {
        bail!(BuildError::SourceTree(src.clone()));
    }

    // Fresh staging copy; no incremental state survives between builds.
    if output.exists() {
        fs::remove_dir_all(output)?;
    }
    copy_tree(src, output)?;

    let caches = SiteCaches::load(&config.build.templates, &config.build.components)?;
    let mut urls = UrlSet::default();

    let feed_dirs = find_feed_dirs(output, config)?;
    let mut jobs = collect_jobs(config, &feed_dirs)?;
    log!("build"; "converting {} markdown files", jobs.len());

    let requests: Vec<RenderRequest> = jobs
        .iter_mut()
        .map(|job| RenderRequest {
            source: PathBuf::from(&job.label),
            body: std::mem::take(&mut job.body),
            renderer: job.renderer,
        })
        .collect();
    let rendered = render_all(&requests, &config.build.renderer_command)?;

    for (job, html) in jobs.iter().zip(rendered) {
        post_process(job, html, config, &caches, &mut urls)?;
    }

    write_feeds(config, &feed_dirs, &jobs)?;
    process_static_pages(config, &caches, &mut urls)?;
    write_sitemap(config, urls.as_slice())?;

    log!("build"; "done in {:.2?}", started.elapsed());
    Ok(())
}

// ============================================================================
// Tree Walk & Classification
// ============================================================================

/// Copy the source tree verbatim into the output directory.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|_| BuildError::SourceTree(src.to_path_buf()))?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

/// Find every directory whose `index.md` declares `type: feed`, mapped to
/// that index's frontmatter (the feed channel metadata).
fn find_feed_dirs(output: &Path, config: &SiteConfig) -> Result<HashMap<PathBuf, Frontmatter>> {
    let mut feed_dirs = HashMap::new();

    for entry in WalkDir::new(output).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let index = entry.path().join("index.md");
        if !index.is_file() {
            continue;
        }

        let text = fs::read_to_string(&index)?;
        let fm = parse_frontmatter(&text, &job_label(&index, config))?;
        if fm.get("type") == Some("feed") {
            feed_dirs.insert(entry.path().to_path_buf(), fm);
        }
    }

    Ok(feed_dirs)
}

/// Source path as the user knows it (under `src/`, not the working copy).
fn job_label(path: &Path, config: &SiteConfig) -> String {
    let rel = path
        .strip_prefix(&config.build.output)
        .unwrap_or(path);
    config.build.src.join(rel).display().to_string()
}

/// Walk the output tree and build one job per surviving Markdown file.
///
/// Draft pages (`draft: true`) are skipped entirely unless draft building
/// is enabled; their copied sources are removed so no raw Markdown leaks
/// into the published tree.
fn collect_jobs(
    config: &SiteConfig,
    feed_dirs: &HashMap<PathBuf, Frontmatter>,
) -> Result<Vec<ConversionJob>> {
    let mut jobs = Vec::new();

    for entry in WalkDir::new(&config.build.output).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "md") {
            continue;
        }

        let label = job_label(path, config);
        let text = fs::read_to_string(path)?;
        let frontmatter = parse_frontmatter(&text, &label)?;

        if !config.build.drafts && frontmatter.get("draft") == Some("true") {
            fs::remove_file(path)?;
            continue;
        }

        let is_index = path.file_stem().is_some_and(|s| s == "index");
        let parent = path.parent().map(Path::to_path_buf);
        let in_feed_dir = parent
            .as_ref()
            .is_some_and(|dir| feed_dirs.contains_key(dir));

        jobs.push(ConversionJob {
            output: path.with_extension("html"),
            label,
            body: frontmatter.body(&text).to_owned(),
            renderer: RendererKind::from_frontmatter(frontmatter.get("renderer")),
            is_feed_member: in_feed_dir && !is_index,
            feed_dir: (in_feed_dir && !is_index).then(|| parent.unwrap_or_default()),
            frontmatter,
            source: path.to_path_buf(),
        });
    }

    Ok(jobs)
}

// ============================================================================
// Per-Job Post-Processing
// ============================================================================

/// Resolve the page template for a job.
///
/// Order: explicit `template` frontmatter key, then the implicit
/// `<directory>_list.html` for feed members when that file exists, then
/// `default.html`.
fn resolve_template<'a>(job: &ConversionJob, caches: &'a SiteCaches) -> Result<&'a str> {
    let name = if let Some(explicit) = job.frontmatter.get("template") {
        explicit.to_owned()
    } else {
        let implicit = job
            .is_feed_member
            .then(|| {
                let dir = job.feed_dir.as_ref()?.file_name()?.to_str()?;
                let candidate = format!("{dir}_list.html");
                caches.templates.contains_key(&candidate).then_some(candidate)
            })
            .flatten();
        implicit.unwrap_or_else(|| "default.html".to_owned())
    };

    caches
        .templates
        .get(&name)
        .map(String::as_str)
        .ok_or_else(|| BuildError::TemplateMissing(name).into())
}

/// Turn one rendered Markdown body into the final HTML page.
fn post_process(
    job: &ConversionJob,
    html: String,
    config: &SiteConfig,
    caches: &SiteCaches,
    urls: &mut UrlSet,
) -> Result<()> {
    let template = resolve_template(job, caches)?;
    let fm = &job.frontmatter;

    let is_index = job
        .output
        .file_name()
        .is_some_and(|n| n == "index.html");
    let content = if is_index {
        meta::rewrite_relative_hrefs(&html, &meta::page_dir_path(&job.output, config))
    } else {
        html
    };

    let url = meta::page_url(&job.output, config);
    let desc = fm.get_or_empty("desc");
    let noindex = desc == "no-index";
    let meta_tags = meta::build_meta_tags(fm.get_or_empty("title"), desc, &url, noindex);
    if !noindex {
        urls.push(url);
    }

    let author = fm
        .get("author")
        .unwrap_or(&config.base.author)
        .to_owned();
    let ctx = TemplateContext {
        title: fm.get_or_empty("title").to_owned(),
        date: fm.get_or_empty("date").to_owned(),
        author,
        content,
        lang: config.base.language.clone(),
        meta_tags,
        reload: if config.serve.live_reload {
            RELOAD_SNIPPET.to_owned()
        } else {
            String::new()
        },
    };

    let page = render_template(template, &ctx);
    fs::write(&job.output, page)
        .with_context(|| format!("Failed to write {}", job.output.display()))?;
    fs::remove_file(&job.source)?;

    Ok(())
}

// ============================================================================
// Static HTML Pass
// ============================================================================

/// Expand components in every remaining `.html` file, rename non-index
/// pages extensionless, and collect the index pages' sitemap entries.
fn process_static_pages(
    config: &SiteConfig,
    caches: &SiteCaches,
    urls: &mut UrlSet,
) -> Result<()> {
    // Collect first; renames during the walk would confuse the iterator.
    let pages: Vec<PathBuf> = WalkDir::new(&config.build.output)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| !is_skipped(p))
        .filter(|p| p.extension().is_some_and(|e| e == "html"))
        .collect();

    for path in pages {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let expanded = expand_components(&content, &caches.components)?;

        if path.file_name().is_some_and(|n| n == "index.html") {
            if !expanded.contains(r#"content="noindex""#) {
                urls.push(meta::page_url(&path, config));
            }
            fs::write(&path, expanded)?;
        } else {
            // Extensionless static pages: about.html is served as /about.
            let bare = path.with_extension("");
            fs::write(&bare, expanded)?;
            fs::remove_file(&path)?;
        }
    }

    Ok(())
}

/// Files the static pass never touches.
fn is_skipped(path: &Path) -> bool {
    if path.file_name().is_some_and(|n| n == ".DS_Store") {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
}

// ============================================================================
// Tests
// ============================================================================
