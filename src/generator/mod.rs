//! Output artifact generators: per-section RSS feeds and the sitemap.

pub mod rss;
pub mod sitemap;
