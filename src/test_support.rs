//! In-memory stand-ins for the network-facing traits.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::extractor::{Extractor, ExtractorLink, LinkKind, ManifestExpander, Quality, SubtitleFile};
use crate::http::PageFetcher;

/// Serves canned bodies by exact url and records every request.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeFetcher {
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn get_text(&self, url: &str, referer: Option<&str>) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), referer.map(str::to_string)));
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Http(format!("status 404 for {}", url)))
    }
}

enum Behavior {
    Links(Vec<ExtractorLink>),
    Fail,
    Panic,
}

/// Generic extractor with per-url scripted results. Unknown urls yield nothing.
#[derive(Default)]
pub struct FakeExtractor {
    behaviors: HashMap<String, Behavior>,
    subtitles: HashMap<String, Vec<SubtitleFile>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeExtractor {
    /// Adds a link at `{url}/stream.m3u8`.
    pub fn with_link(mut self, url: &str, name: &str, quality: Quality) -> Self {
        let link = ExtractorLink {
            source: name.to_string(),
            name: name.to_string(),
            url: format!("{}/stream.m3u8", url),
            referer: url.to_string(),
            quality,
            kind: LinkKind::M3u8,
        };
        match self.behaviors.entry(url.to_string()).or_insert_with(|| Behavior::Links(Vec::new())) {
            Behavior::Links(links) => links.push(link),
            other => *other = Behavior::Links(vec![link]),
        }
        self
    }

    pub fn with_subtitle(mut self, url: &str, label: &str, subtitle_url: &str) -> Self {
        self.subtitles
            .entry(url.to_string())
            .or_default()
            .push(SubtitleFile { label: label.to_string(), url: subtitle_url.to_string() });
        self
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.behaviors.insert(url.to_string(), Behavior::Fail);
        self
    }

    pub fn with_panic(mut self, url: &str) -> Self {
        self.behaviors.insert(url.to_string(), Behavior::Panic);
        self
    }

    /// Urls passed to `extract`, in call order.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract(
        &self,
        url: &str,
        _referer: Option<&str>,
        subtitles: &mut (dyn FnMut(SubtitleFile) + Send),
    ) -> Result<Vec<ExtractorLink>> {
        self.calls.lock().unwrap().push(url.to_string());

        for subtitle in self.subtitles.get(url).cloned().unwrap_or_default() {
            subtitles(subtitle);
        }

        match self.behaviors.get(url) {
            Some(Behavior::Links(links)) => Ok(links.clone()),
            Some(Behavior::Fail) => Err(Error::Extract(format!("scripted failure for {}", url))),
            Some(Behavior::Panic) => panic!("scripted panic for {}", url),
            None => Ok(Vec::new()),
        }
    }
}

/// Expands a manifest to itself, or to scripted variant heights.
#[derive(Default)]
pub struct FakeExpander {
    variants: HashMap<String, Vec<u32>>,
}

impl FakeExpander {
    pub fn with_variants(mut self, url: &str, heights: &[u32]) -> Self {
        self.variants.insert(url.to_string(), heights.to_vec());
        self
    }
}

#[async_trait]
impl ManifestExpander for FakeExpander {
    async fn expand(&self, name: &str, url: &str, referer: &str) -> Vec<ExtractorLink> {
        let link = |url: String, quality: Quality| ExtractorLink {
            source: name.to_string(),
            name: name.to_string(),
            url,
            referer: referer.to_string(),
            quality,
            kind: LinkKind::M3u8,
        };

        match self.variants.get(url) {
            Some(heights) => heights
                .iter()
                .map(|h| link(format!("{}#{}", url, h), Quality::Height(*h)))
                .collect(),
            None => vec![link(url.to_string(), Quality::Unknown)],
        }
    }
}

pub fn noop_subtitles() -> impl FnMut(SubtitleFile) + Send {
    |_| {}
}

/// Base64 option payload wrapping an iframe for `url`.
pub fn mirror(url: &str) -> String {
    STANDARD.encode(format!(r#"<iframe src="{}" frameborder="0" allowfullscreen></iframe>"#, url))
}

/// Episode page with a `.mobius` mirror select.
pub fn episode_page(options: &[(String, &str)]) -> String {
    let body: String = options
        .iter()
        .map(|(value, text)| format!(r#"<option value="{}">{}</option>"#, value, text))
        .collect();
    format!(
        r#"<html><body><div class="item video-nav"><select class="mirror mobius" name="mirror">
<option value="">Select Video Server</option>{}</select></div></body></html>"#,
        body
    )
}
