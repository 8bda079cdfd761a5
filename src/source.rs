//! Video option decoding and ranking.
//!
//! Episode pages list their mirrors as `<option>` elements whose `value` is a
//! base64-encoded `<iframe>` snippet. Each one that decodes becomes a
//! `CandidateSource`; the rest are dropped without noise.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::cmp::Ordering;
use std::sync::LazyLock;
use url::Url;

use crate::error::{Error, Result};
use crate::utils::{collapse_whitespace, https};

static OPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".mobius option").expect("invalid selector"));
static IFRAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("iframe").expect("invalid selector"));
/// Standard alphabet, padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static QUALITY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{3,4})").expect("invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Indonesian,
    Unknown,
}

impl Language {
    /// Case-insensitive label match; English is checked first.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("english") {
            Language::English
        } else if lower.contains("indo") || lower.contains("indonesia") {
            Language::Indonesian
        } else {
            Language::Unknown
        }
    }

    /// Name appended to link labels. Empty for `Unknown`.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Indonesian => "Indonesian",
            Language::Unknown => "",
        }
    }

    fn tier(&self) -> u8 {
        match self {
            Language::English => 2,
            Language::Unknown => 1,
            Language::Indonesian => 0,
        }
    }
}

/// One decoded mirror option.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSource {
    /// Embedded player frame url.
    pub url: String,
    /// Option text, or the frame url when the text is blank.
    pub label: String,
    pub host: String,
    pub language: Language,
    pub quality: Option<u32>,
    /// Position among all options on the page, including dropped ones.
    pub order: usize,
}

impl CandidateSource {
    pub fn is_dailymotion(&self) -> bool {
        let host = Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
            .unwrap_or_default();
        host.contains("dailymotion") || host.contains("geo.dmcdn")
    }
}

/// First 3-4 digit run in a label.
pub fn quality_from_label(label: &str) -> Option<u32> {
    QUALITY_REGEX
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn decode_payload(payload: &str) -> Result<String> {
    let bytes = PAYLOAD_ENGINE
        .decode(payload.trim())
        .map_err(|e| Error::Decode(format!("base64: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Decode(format!("utf-8: {}", e)))
}

/// Decode one option element. `None` for blank payloads, undecodable
/// payloads, and snippets without an iframe `src`.
pub fn decode_option(option: ElementRef<'_>, order: usize) -> Option<CandidateSource> {
    let payload = option.value().attr("value")?;
    if payload.trim().is_empty() {
        return None;
    }

    let snippet = match decode_payload(payload) {
        Ok(snippet) => snippet,
        Err(e) => {
            tracing::debug!("dropping option {}: {}", order, e);
            return None;
        }
    };
    let fragment = Html::parse_fragment(&snippet);
    let iframe = fragment.select(&IFRAME_SELECTOR).next()?;

    let raw_url = iframe.value().attr("src").map(str::trim).unwrap_or_default();
    if raw_url.is_empty() {
        return None;
    }

    let url = https(raw_url);
    let label = collapse_whitespace(&option.text().collect::<String>());

    let host = iframe
        .value()
        .attr("data-host")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            Url::parse(&url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_default()
        });

    Some(CandidateSource {
        quality: quality_from_label(&label),
        language: Language::from_label(&label),
        label: if label.is_empty() { url.clone() } else { label },
        host,
        url,
        order,
    })
}

/// Decode every mirror option of an episode page, in page order.
pub fn parse_sources(html: &str) -> Vec<CandidateSource> {
    let document = Html::parse_document(html);
    document
        .select(&OPTION_SELECTOR)
        .enumerate()
        .filter_map(|(index, option)| decode_option(option, index))
        .collect()
}

/// English first, Indonesian last, then higher quality, then page order.
pub fn preferred_order(a: &CandidateSource, b: &CandidateSource) -> Ordering {
    b.language
        .tier()
        .cmp(&a.language.tier())
        .then_with(|| b.quality.unwrap_or(0).cmp(&a.quality.unwrap_or(0)))
        .then_with(|| a.order.cmp(&b.order))
}

pub fn rank(sources: &mut [CandidateSource]) {
    sources.sort_by(preferred_order);
}
