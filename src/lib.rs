//! Animexin scraping and link resolution.
//!
//! `Catalog` browses the site; `LinkLoader` turns an episode page into ranked,
//! labeled playable links. Network access goes through the `PageFetcher`,
//! `Extractor` and `ManifestExpander` traits so hosts can swap them out.

pub mod catalog;
pub mod config;
pub mod dailymotion;
pub mod decorate;
pub mod error;
pub mod extractor;
pub mod hls;
pub mod http;
pub mod links;
pub mod source;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use catalog::{Catalog, Episode, HomePage, MAIN_PAGE, SearchResult, Show, ShowKind};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use extractor::{Extractor, ExtractorLink, ExtractorRegistry, LinkKind, ManifestExpander, Quality, SubtitleFile};
pub use hls::HlsExpander;
pub use http::{HttpFetcher, PageFetcher};
pub use links::{LinkLoader, LoadedLinks};
pub use source::{CandidateSource, Language};
