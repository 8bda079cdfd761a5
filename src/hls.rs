//! HLS master playlist expansion.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::extractor::{ExtractorLink, LinkKind, ManifestExpander, Quality};
use crate::http::PageFetcher;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Variant {
    pub height: Option<u32>,
    pub uri: String,
}

/// Variants of a master playlist in source order. Media playlists yield none.
pub(crate) fn parse_master_variants(text: &str) -> Vec<Variant> {
    let mut out = Vec::new();
    let mut pending: Option<Option<u32>> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if let Some(attrs) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            let height = attrs
                .split(',')
                .filter_map(|part| part.trim().strip_prefix("RESOLUTION="))
                .filter_map(|res| res.split_once('x'))
                .find_map(|(_, h)| h.parse::<u32>().ok());
            pending = Some(height);
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(height) = pending.take() {
            out.push(Variant { height, uri: line.to_string() });
        }
    }

    out
}

/// `ManifestExpander` that reads master playlists over HTTP.
pub struct HlsExpander {
    fetcher: Arc<dyn PageFetcher>,
}

impl HlsExpander {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

fn manifest_link(name: &str, url: &str, referer: &str, quality: Quality) -> ExtractorLink {
    ExtractorLink {
        source: name.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        referer: referer.to_string(),
        quality,
        kind: LinkKind::M3u8,
    }
}

#[async_trait]
impl ManifestExpander for HlsExpander {
    async fn expand(&self, name: &str, url: &str, referer: &str) -> Vec<ExtractorLink> {
        let referer_header = Some(referer).filter(|r| !r.is_empty());
        let text = match self.fetcher.get_text(url, referer_header).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("manifest {} unreadable, passing through: {}", url, e);
                return vec![manifest_link(name, url, referer, Quality::Unknown)];
            }
        };

        let variants = parse_master_variants(&text);
        if variants.is_empty() {
            return vec![manifest_link(name, url, referer, Quality::Unknown)];
        }

        let base = Url::parse(url).ok();
        variants
            .into_iter()
            .filter_map(|variant| {
                let resolved = match &base {
                    Some(base) => base.join(&variant.uri).ok()?.to_string(),
                    None => variant.uri,
                };
                Some(manifest_link(name, &resolved, referer, Quality::from_height(variant.height)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeFetcher;

    const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
low/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=4000000,RESOLUTION=1920x1080,CODECS=\"avc1.640028\"
https://other.test/hi/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=100000
audio/index.m3u8
";

    #[test]
    fn test_parse_master_variants_in_source_order() {
        let variants = parse_master_variants(MASTER);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0], Variant { height: Some(360), uri: "low/index.m3u8".into() });
        assert_eq!(variants[1].height, Some(1080));
        assert_eq!(variants[2].height, None);
    }

    #[test]
    fn test_parse_media_playlist_has_no_variants() {
        let media = "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:10,\nseg0.ts\n";
        assert!(parse_master_variants(media).is_empty());
    }

    #[tokio::test]
    async fn test_expand_master_resolves_relative_uris() {
        let fetcher = FakeFetcher::default().with_page("https://cdn.test/v/master.m3u8", MASTER);
        let expander = HlsExpander::new(Arc::new(fetcher));
        let links = expander.expand("Main", "https://cdn.test/v/master.m3u8", "https://ref.test/").await;

        assert_eq!(links.len(), 3);
        assert_eq!(links[0].url, "https://cdn.test/v/low/index.m3u8");
        assert_eq!(links[0].quality, Quality::Height(360));
        assert_eq!(links[1].url, "https://other.test/hi/index.m3u8");
        assert_eq!(links[2].quality, Quality::Unknown);
        assert!(links.iter().all(|l| l.referer == "https://ref.test/" && l.kind == LinkKind::M3u8));
    }

    #[tokio::test]
    async fn test_expand_unreachable_manifest_passes_through() {
        let expander = HlsExpander::new(Arc::new(FakeFetcher::default()));
        let links = expander.expand("Main", "https://cdn.test/gone.m3u8", "").await;

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://cdn.test/gone.m3u8");
        assert_eq!(links[0].quality, Quality::Unknown);
    }
}
