//! Episode link loading.
//!
//! Decodes the mirror options of an episode page, ranks them, and resolves
//! each in ranked order. A source that fails only costs its own links.

use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::dailymotion::{DailymotionResolver, Outcome};
use crate::decorate::decorate;
use crate::extractor::{Extractor, ExtractorLink, ManifestExpander, SubtitleFile};
use crate::http::PageFetcher;
use crate::source::{CandidateSource, parse_sources, rank};

/// Everything one `load_links` call emitted, in emission order.
#[derive(Debug, Default, Serialize)]
pub struct LoadedLinks {
    /// True when the page had at least one decodable mirror.
    pub found: bool,
    pub links: Vec<ExtractorLink>,
    pub subtitles: Vec<SubtitleFile>,
}

pub struct LinkLoader {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn Extractor>,
    dailymotion: DailymotionResolver,
}

impl LinkLoader {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn Extractor>,
        expander: Arc<dyn ManifestExpander>,
    ) -> Self {
        let dailymotion = DailymotionResolver::new(fetcher.clone(), expander);
        Self { fetcher, extractor, dailymotion }
    }

    /// Ranked candidate sources of an episode page. Empty when the page
    /// cannot be fetched.
    pub async fn sources(&self, page_url: &str) -> Vec<CandidateSource> {
        let html = match self.fetcher.get_text(page_url, None).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("could not fetch episode page {}: {}", page_url, e);
                return Vec::new();
            }
        };

        let mut sources = parse_sources(&html);
        rank(&mut sources);
        sources
    }

    /// Resolve every mirror of `page_url`, streaming results to the sinks.
    ///
    /// Returns whether any candidate source existed, even if none of them
    /// produced a link.
    pub async fn load_links(
        &self,
        page_url: &str,
        on_subtitle: &mut (dyn FnMut(SubtitleFile) + Send),
        on_link: &mut (dyn FnMut(ExtractorLink) + Send),
    ) -> bool {
        let sources = self.sources(page_url).await;
        tracing::info!("{} candidate sources on {}", sources.len(), page_url);

        for source in &sources {
            self.load_source(source, on_subtitle, on_link).await;
        }

        !sources.is_empty()
    }

    /// `load_links` with the results gathered into one value.
    pub async fn collect_links(&self, page_url: &str) -> LoadedLinks {
        let mut links = Vec::new();
        let mut subtitles = Vec::new();
        let found = self
            .load_links(page_url, &mut |s| subtitles.push(s), &mut |l| links.push(l))
            .await;
        LoadedLinks { found, links, subtitles }
    }

    /// Resolve a single source. Never fails; problems mean fewer links.
    pub async fn load_source(
        &self,
        source: &CandidateSource,
        on_subtitle: &mut (dyn FnMut(SubtitleFile) + Send),
        on_link: &mut (dyn FnMut(ExtractorLink) + Send),
    ) {
        if source.is_dailymotion() {
            let resolved = AssertUnwindSafe(self.dailymotion.resolve(source, on_subtitle, on_link))
                .catch_unwind()
                .await;
            match resolved {
                Ok(Outcome::Emitted) => return,
                Ok(Outcome::Fallback) => tracing::debug!("falling back to generic extractor for {}", source.url),
                Err(_) => {
                    tracing::warn!("dailymotion resolver panicked on {}", source.url);
                    return;
                }
            }
        }

        self.load_generic(source, on_subtitle, on_link).await;
    }

    async fn load_generic(
        &self,
        source: &CandidateSource,
        on_subtitle: &mut (dyn FnMut(SubtitleFile) + Send),
        on_link: &mut (dyn FnMut(ExtractorLink) + Send),
    ) {
        let extracted = AssertUnwindSafe(self.extractor.extract(&source.url, None, on_subtitle))
            .catch_unwind()
            .await;

        match extracted {
            Ok(Ok(links)) => {
                tracing::debug!("{} links from {} ({})", links.len(), source.label, source.url);
                for link in links {
                    on_link(decorate(link, source));
                }
            }
            Ok(Err(e)) => tracing::warn!("extractor failed for {}: {}", source.url, e),
            Err(_) => tracing::warn!("extractor panicked on {}", source.url),
        }
    }
}
