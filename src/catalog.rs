//! Site browsing: home sections, search, and show pages.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use url::Url;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::http::PageFetcher;
use crate::utils::{between_dashes, collapse_whitespace, fix_url};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

static CARD: LazyLock<Selector> = LazyLock::new(|| selector("div.listupd > article"));
static CARD_LINK: LazyLock<Selector> = LazyLock::new(|| selector("div.bsx > a"));
static CARD_IMG: LazyLock<Selector> = LazyLock::new(|| selector("div.bsx > a img"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h1.entry-title"));
static FIRST_EPISODE: LazyLock<Selector> = LazyLock::new(|| selector(".eplister li > a"));
static POSTER: LazyLock<Selector> = LazyLock::new(|| selector("div.ime > img"));
static OG_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:image"]"#));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector("div.entry-content"));
static INFO: LazyLock<Selector> = LazyLock::new(|| selector(".spe"));
static EPISODE_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("div.episodelist > ul > li"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static ANCHOR_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("a span"));
static ANCHOR_IMG: LazyLock<Selector> = LazyLock::new(|| selector("a img"));

/// Home page sections as (name, listing path).
pub const MAIN_PAGE: [(&str, &str); 5] = [
    ("Recently Updated", "anime/?status=ongoing&order=update"),
    ("Popular", "anime/?status=ongoing&order&order=popular"),
    ("Donghua", "anime/?"),
    ("Movies", "anime/?status=&type=movie&page="),
    ("Anime (RAW)", "anime/?sub=raw"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub name: String,
    pub items: Vec<SearchResult>,
    pub has_next: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowKind {
    Movie,
    Series,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub name: String,
    /// Episode page url; feed this to `LinkLoader::load_links`.
    pub url: String,
    pub poster: Option<String>,
}

/// A show page. Movies carry a single episode pointing at their watch page.
#[derive(Debug, Clone, Serialize)]
pub struct Show {
    pub title: String,
    pub url: String,
    pub poster: Option<String>,
    pub plot: Option<String>,
    pub kind: ShowKind,
    pub episodes: Vec<Episode>,
}

/// Fields read from the show page before the episode list is fetched.
#[derive(Debug, Clone, PartialEq)]
struct ShowPage {
    title: String,
    poster: Option<String>,
    plot: Option<String>,
    kind: ShowKind,
    first_episode: Option<String>,
}

fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn to_search_result(card: ElementRef<'_>, base: &Url) -> Option<SearchResult> {
    let link = card.select(&CARD_LINK).next()?;
    let url = fix_url(base, link.value().attr("href").unwrap_or_default())?;
    let title = link.value().attr("title").unwrap_or_default().trim().to_string();
    let poster = card
        .select(&CARD_IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| fix_url(base, src));

    Some(SearchResult { title, url, poster })
}

fn parse_cards(html: &str, base: &Url) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    document
        .select(&CARD)
        .filter_map(|card| to_search_result(card, base))
        .collect()
}

fn parse_show_page(html: &str, base: &Url) -> ShowPage {
    let document = Html::parse_document(html);

    let title = document.select(&TITLE).next().map(text_of).unwrap_or_default();
    let first_episode = document
        .select(&FIRST_EPISODE)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| fix_url(base, href));
    let plot = document.select(&DESCRIPTION).next().map(text_of).and_then(non_empty);
    let info = document.select(&INFO).next().map(text_of).unwrap_or_default();

    let poster = document
        .select(&POSTER)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| fix_url(base, src))
        .or_else(|| {
            document
                .select(&OG_IMAGE)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .and_then(|content| fix_url(base, content))
        });

    let kind = if info.contains("Movie") { ShowKind::Movie } else { ShowKind::Series };

    ShowPage { title, poster, plot, kind, first_episode }
}

/// Episode list in site order (newest first).
fn parse_episode_list(html: &str, base: &Url) -> Vec<Episode> {
    let document = Html::parse_document(html);
    document
        .select(&EPISODE_ITEM)
        .filter_map(|item| {
            let url = item
                .select(&ANCHOR)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| fix_url(base, href))?;
            let name = between_dashes(&item.select(&ANCHOR_SPAN).map(text_of).collect::<Vec<_>>().join(" "));
            let poster = item
                .select(&ANCHOR_IMG)
                .next()
                .and_then(|img| img.value().attr("src"))
                .and_then(|src| fix_url(base, src));
            Some(Episode { name, url, poster })
        })
        .collect()
}

pub struct Catalog {
    base: Url,
    fetcher: Arc<dyn PageFetcher>,
    search_pages: u32,
}

impl Catalog {
    pub fn new(config: &AppConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        Ok(Self { base, fetcher, search_pages: config.search_pages })
    }

    fn root(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// One page of a home section. `section` indexes `MAIN_PAGE`.
    pub async fn main_page(&self, section: usize, page: u32) -> Result<HomePage> {
        let (name, path) = MAIN_PAGE
            .get(section)
            .ok_or_else(|| Error::Parse(format!("no home section {}", section)))?;
        let url = format!("{}/{}&page={}", self.root(), path, page);

        let html = self.fetcher.get_text(&url, None).await?;
        let items = parse_cards(&html, &self.base);
        tracing::debug!("home section '{}' page {}: {} items", name, page, items.len());

        Ok(HomePage { name: name.to_string(), items, has_next: true })
    }

    /// Walk search result pages until one is empty or adds nothing new.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mut results: Vec<SearchResult> = Vec::new();

        for page in 1..=self.search_pages {
            let url = format!("{}/page/{}/?s={}", self.root(), page, urlencoding::encode(query));
            let html = match self.fetcher.get_text(&url, None).await {
                Ok(html) => html,
                Err(e) if page > 1 => {
                    tracing::debug!("search stopped at page {}: {}", page, e);
                    break;
                }
                Err(e) => return Err(e),
            };

            let found = parse_cards(&html, &self.base);
            let fresh: Vec<_> = found.into_iter().filter(|r| !results.iter().any(|known| known.url == r.url)).collect();
            if fresh.is_empty() {
                break;
            }
            results.extend(fresh);
        }

        tracing::info!("search '{}' found {} results", query, results.len());
        Ok(results)
    }

    /// Read a show page, following its episode list for series.
    pub async fn load(&self, url: &str) -> Result<Show> {
        let html = self.fetcher.get_text(url, None).await?;
        let page = parse_show_page(&html, &self.base);

        let episodes = match (page.kind, page.first_episode) {
            (ShowKind::Movie, Some(watch_url)) => vec![Episode {
                name: page.title.clone(),
                url: watch_url,
                poster: page.poster.clone(),
            }],
            (ShowKind::Movie, None) => Vec::new(),
            (ShowKind::Series, Some(episode_page)) => {
                let list_html = self.fetcher.get_text(&episode_page, None).await?;
                let mut episodes = parse_episode_list(&list_html, &self.base);
                episodes.reverse();
                episodes
            }
            (ShowKind::Series, None) => {
                tracing::debug!("no episode link on {}", url);
                Vec::new()
            }
        };

        Ok(Show {
            title: page.title,
            url: url.to_string(),
            poster: page.poster,
            plot: page.plot,
            kind: page.kind,
            episodes,
        })
    }
}
