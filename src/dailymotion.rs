//! Dailymotion embeds.
//!
//! The player metadata endpoint lists every stream grouped by quality bucket,
//! which gives better labels than the generic extractor. Any failure here
//! hands the source back to the generic path.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::decorate::decorate;
use crate::extractor::{ExtractorLink, ManifestExpander, SubtitleFile};
use crate::http::{PageFetcher, fetch_json};
use crate::source::CandidateSource;

pub const METADATA_ENDPOINT: &str = "https://www.dailymotion.com/player/metadata/video";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailymotionStream {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: String,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailymotionSubtitle {
    pub language: Option<String>,
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DailymotionMetadata {
    /// Quality buckets in document order.
    #[serde(default, deserialize_with = "ordered_buckets")]
    pub qualities: Vec<(String, Vec<DailymotionStream>)>,
    #[serde(default)]
    pub subtitles: Option<Vec<DailymotionSubtitle>>,
}

struct BucketVisitor;

impl<'de> Visitor<'de> for BucketVisitor {
    type Value = Vec<(String, Vec<DailymotionStream>)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of quality buckets to stream lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut buckets = Vec::new();
        while let Some((key, streams)) = map.next_entry::<String, Vec<DailymotionStream>>()? {
            buckets.push((key, streams));
        }
        Ok(buckets)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }
}

fn ordered_buckets<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<(String, Vec<DailymotionStream>)>, D::Error> {
    deserializer.deserialize_any(BucketVisitor)
}

/// Id after the last `/video/`, cut at the first `?` or space.
pub fn video_id(url: &str) -> Option<&str> {
    let (_, tail) = url.rsplit_once("/video/")?;
    let id = tail.split(['?', ' ']).next().unwrap_or_default();
    (!id.trim().is_empty()).then_some(id)
}

/// Every stream paired with its effective height, highest first.
///
/// A stream's own height wins over its bucket key. Streams with neither sort
/// as 0 but keep `None`.
pub fn reconcile(metadata: &DailymotionMetadata) -> Vec<(&DailymotionStream, Option<u32>)> {
    let mut pairs: Vec<_> = metadata
        .qualities
        .iter()
        .flat_map(|(key, streams)| {
            let key_height = key.trim().parse::<u32>().ok();
            streams.iter().map(move |stream| (stream, stream.height.or(key_height)))
        })
        .collect();

    pairs.sort_by(|a, b| b.1.unwrap_or(0).cmp(&a.1.unwrap_or(0)));
    pairs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Emitted,
    Fallback,
}

pub struct DailymotionResolver {
    fetcher: Arc<dyn PageFetcher>,
    expander: Arc<dyn ManifestExpander>,
}

impl DailymotionResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>, expander: Arc<dyn ManifestExpander>) -> Self {
        Self { fetcher, expander }
    }

    pub fn metadata_url(id: &str) -> String {
        format!("{}/{}", METADATA_ENDPOINT, id)
    }

    /// Emit links and subtitles for `source` from player metadata.
    ///
    /// Returns `Outcome::Fallback` without emitting anything when the id is
    /// missing, the fetch or parse fails, or no quality bucket exists.
    pub async fn resolve(
        &self,
        source: &CandidateSource,
        on_subtitle: &mut (dyn FnMut(SubtitleFile) + Send),
        on_link: &mut (dyn FnMut(ExtractorLink) + Send),
    ) -> Outcome {
        let Some(id) = video_id(&source.url) else {
            tracing::debug!("no dailymotion id in {}", source.url);
            return Outcome::Fallback;
        };

        let metadata_url = Self::metadata_url(id);
        let metadata: DailymotionMetadata =
            match fetch_json(self.fetcher.as_ref(), &metadata_url, Some(&source.url)).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::debug!("dailymotion metadata for {} unavailable: {}", id, e);
                    return Outcome::Fallback;
                }
            };

        if metadata.qualities.is_empty() {
            tracing::debug!("dailymotion metadata for {} has no qualities", id);
            return Outcome::Fallback;
        }

        for (stream, height) in reconcile(&metadata) {
            let bucket_source = CandidateSource { quality: height, ..source.clone() };
            for link in self.expander.expand(&source.label, &stream.url, &source.url).await {
                on_link(decorate(link, &bucket_source));
            }
        }

        for subtitle in metadata.subtitles.unwrap_or_default() {
            on_subtitle(SubtitleFile { label: subtitle.label, url: subtitle.url });
        }

        Outcome::Emitted
    }
}
