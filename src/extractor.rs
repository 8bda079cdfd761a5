//! Playable link types and the external resolution capabilities.
//!
//! `Extractor` is the generic "given an embed url, find direct links" seam and
//! `ManifestExpander` turns one manifest into concrete variant links. Both are
//! injected into the link pipeline so it can run without network access.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::error::Result;

/// Stream quality: a known pixel height or unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Unknown,
    Height(u32),
}

impl Quality {
    /// Zero and missing heights are both unknown.
    pub fn from_height(height: Option<u32>) -> Self {
        match height {
            Some(h) if h > 0 => Quality::Height(h),
            _ => Quality::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Quality::Height(_))
    }

    pub fn height(&self) -> Option<u32> {
        match self {
            Quality::Height(h) => Some(*h),
            Quality::Unknown => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Height(h) => write!(f, "{}p", h),
            Quality::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Video,
    M3u8,
}

/// A playable url plus what a player needs to open it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractorLink {
    /// Name of the extractor that produced the link.
    pub source: String,
    /// Display name shown to the user.
    pub name: String,
    pub url: String,
    /// Referer the host expects on playback requests.
    pub referer: String,
    pub quality: Quality,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleFile {
    pub label: String,
    pub url: String,
}

/// Generic embed resolver.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        url: &str,
        referer: Option<&str>,
        subtitles: &mut (dyn FnMut(SubtitleFile) + Send),
    ) -> Result<Vec<ExtractorLink>>;
}

/// Expands a manifest url into one link per playable variant.
///
/// Never fails: a manifest that cannot be read is returned as a single link.
#[async_trait]
pub trait ManifestExpander: Send + Sync {
    async fn expand(&self, name: &str, url: &str, referer: &str) -> Vec<ExtractorLink>;
}

/// One host-specific resolver inside an `ExtractorRegistry`.
#[async_trait]
pub trait HostExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, url: &Url) -> bool;

    async fn extract(
        &self,
        url: &str,
        referer: Option<&str>,
        subtitles: &mut (dyn FnMut(SubtitleFile) + Send),
    ) -> Result<Vec<ExtractorLink>>;
}

/// Ordered set of host extractors. The first match that yields links wins.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn HostExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in extractor.
    pub fn with_defaults(expander: Arc<dyn ManifestExpander>) -> Self {
        Self::new().register(DirectMedia::new(expander))
    }

    pub fn register(mut self, extractor: impl HostExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl Extractor for ExtractorRegistry {
    async fn extract(
        &self,
        url: &str,
        referer: Option<&str>,
        subtitles: &mut (dyn FnMut(SubtitleFile) + Send),
    ) -> Result<Vec<ExtractorLink>> {
        let parsed = Url::parse(url)?;

        for extractor in self.extractors.iter().filter(|e| e.matches(&parsed)) {
            match extractor.extract(url, referer, subtitles).await {
                Ok(links) if !links.is_empty() => return Ok(links),
                Ok(_) => tracing::debug!("extractor '{}' found nothing at {}", extractor.name(), url),
                Err(e) => tracing::warn!("extractor '{}' failed for {}: {}", extractor.name(), url, e),
            }
        }

        tracing::debug!("no extractor resolved {}", url);
        Ok(Vec::new())
    }
}

/// Urls that already point at a media file or HLS manifest.
pub struct DirectMedia {
    expander: Arc<dyn ManifestExpander>,
}

impl DirectMedia {
    pub fn new(expander: Arc<dyn ManifestExpander>) -> Self {
        Self { expander }
    }
}

#[async_trait]
impl HostExtractor for DirectMedia {
    fn name(&self) -> &'static str {
        "Main"
    }

    fn matches(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        path.ends_with(".m3u8") || path.ends_with(".mp4")
    }

    async fn extract(
        &self,
        url: &str,
        referer: Option<&str>,
        _subtitles: &mut (dyn FnMut(SubtitleFile) + Send),
    ) -> Result<Vec<ExtractorLink>> {
        let referer = referer.unwrap_or_default();
        let is_manifest = Url::parse(url)?.path().to_ascii_lowercase().ends_with(".m3u8");

        if is_manifest {
            return Ok(self.expander.expand(self.name(), url, referer).await);
        }

        Ok(vec![ExtractorLink {
            source: self.name().to_string(),
            name: self.name().to_string(),
            url: url.to_string(),
            referer: referer.to_string(),
            quality: Quality::Unknown,
            kind: LinkKind::Video,
        }])
    }
}
