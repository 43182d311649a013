//! RSS feed generation for feed directories.
//!
//! A directory whose `index.md` declares `type: feed` gets an RSS 2.0
//! document at `<dir>/index.xml`. Channel metadata comes from that
//! index's frontmatter; one `<item>` per sibling post, ordered by parsed
//! publish date descending.

use crate::{
    config::SiteConfig,
    error::BuildError,
    frontmatter::Frontmatter,
    log,
    pipeline::{ConversionJob, meta::page_url},
};
use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use std::{collections::HashMap, fs, path::PathBuf};

// ============================================================================
// Public API
// ============================================================================

/// Write one feed per feed directory.
pub fn write_feeds(
    config: &SiteConfig,
    feed_dirs: &HashMap<PathBuf, Frontmatter>,
    jobs: &[ConversionJob],
) -> Result<()> {
    let mut dirs: Vec<&PathBuf> = feed_dirs.keys().collect();
    dirs.sort();

    for dir in dirs {
        let channel_meta = &feed_dirs[dir];

        let mut posts: Vec<FeedPost> = jobs
            .iter()
            .filter(|job| job.feed_dir.as_ref() == Some(dir))
            .map(|job| FeedPost::from_job(job, config))
            .collect::<Result<_>>()?;
        posts.sort_by(|a, b| b.date.cmp(&a.date));

        let xml = feed_xml(config, channel_meta, dir, &posts);
        let feed_path = dir.join("index.xml");
        fs::write(&feed_path, xml)?;

        log!("rss"; "{}", feed_path.strip_prefix(&config.build.output).unwrap_or(&feed_path).display());
    }

    Ok(())
}

// ============================================================================
// Feed Posts
// ============================================================================

/// A feed member, derived from a job's frontmatter; exists only during
/// feed assembly.
struct FeedPost {
    title: String,
    link: String,
    description: Option<String>,
    date: DateTime<FixedOffset>,
}

impl FeedPost {
    fn from_job(job: &ConversionJob, config: &SiteConfig) -> Result<Self> {
        let fm = &job.frontmatter;
        let raw = fm.get("date").unwrap_or_default();
        let date = parse_pub_date(raw, &job.label)?;

        Ok(Self {
            title: fm.get_or_empty("title").to_owned(),
            link: page_url(&job.output, config),
            description: fm.get("desc").map(ToOwned::to_owned),
            date,
        })
    }
}

/// Parse a frontmatter publish date.
///
/// RFC 2822 with the common `UTC` zone name accepted
/// (`Mon, 01 Jan 2024 00:00:00 UTC`).
fn parse_pub_date(raw: &str, label: &str) -> Result<DateTime<FixedOffset>, BuildError> {
    let normalized = match raw.trim().strip_suffix(" UTC") {
        Some(prefix) => format!("{prefix} +0000"),
        None => raw.trim().to_owned(),
    };

    DateTime::parse_from_rfc2822(&normalized)
        .map_err(|e| BuildError::parse(label, 1, 1, format!("invalid date `{raw}`: {e}")))
}

// ============================================================================
// XML Assembly
// ============================================================================

/// Build the RSS 2.0 document for one feed directory.
fn feed_xml(
    config: &SiteConfig,
    channel_meta: &Frontmatter,
    dir: &PathBuf,
    posts: &[FeedPost],
) -> String {
    let items: Vec<rss::Item> = posts
        .iter()
        .map(|post| {
            ItemBuilder::default()
                .title(Some(post.title.clone()))
                .link(Some(post.link.clone()))
                .guid(
                    GuidBuilder::default()
                        .permalink(true)
                        .value(post.link.clone())
                        .build(),
                )
                .pub_date(Some(post.date.to_rfc2822()))
                .description(post.description.clone())
                .build()
        })
        .collect();

    ChannelBuilder::default()
        .title(channel_meta.get_or_empty("title"))
        .link(page_url(&dir.join("index.html"), config))
        .description(channel_meta.get_or_empty("desc"))
        .language(Some(
            // The feed index may carry its own language; the site
            // language is the fallback.
            channel_meta
                .get("language")
                .unwrap_or(config.base.language.as_str())
                .to_owned(),
        ))
        .generator(Some("vela".to_string()))
        .items(items)
        .build()
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================
