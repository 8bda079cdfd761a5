use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use animexin::{
    AppConfig, Catalog, ExtractorLink, ExtractorRegistry, HlsExpander, HttpFetcher, LinkLoader, MAIN_PAGE,
    ManifestExpander, PageFetcher, SearchResult,
};

mod player;
mod ui;

use ui::{prompt_input, select_from_list, spinner};

#[derive(Parser)]
#[command(name = "animexin", version, about = "Browse Animexin and play episodes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Anime search query
    query: Option<String>,

    /// Episode number to play (1-based, oldest first)
    #[arg(short, long)]
    episode: Option<usize>,

    /// Preferred stream height, e.g. 1080
    #[arg(short, long)]
    quality: Option<u32>,

    /// Player binary (mpv or vlc)
    #[arg(long)]
    player: Option<String>,

    /// Override the site root
    #[arg(long)]
    base_url: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List a home page section
    Home {
        /// Section index, see `animexin home --help`
        #[arg(short, long, default_value_t = 0)]
        section: usize,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Search titles
    Search { query: String },

    /// Show a title and its episodes
    Load { url: String },

    /// Resolve playable links for an episode page
    Links {
        url: String,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

struct App {
    config: AppConfig,
    catalog: Catalog,
    loader: LinkLoader,
}

impl App {
    fn new(config: AppConfig) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config)?);
        let expander: Arc<dyn ManifestExpander> = Arc::new(HlsExpander::new(fetcher.clone()));
        let extractor = Arc::new(ExtractorRegistry::with_defaults(expander.clone()));

        let catalog = Catalog::new(&config, fetcher.clone())?;
        let loader = LinkLoader::new(fetcher, extractor, expander);
        Ok(Self { config, catalog, loader })
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "animexin=debug" } else { "animexin=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(base_url) = cli.base_url.clone() {
        config.base_url = base_url;
    }
    if let Some(player) = cli.player.clone() {
        config.player = player;
    }
    config.validate().context("invalid configuration")?;

    let app = App::new(config)?;

    match cli.command {
        Some(Commands::Home { section, page }) => home(&app, section, page).await,
        Some(Commands::Search { query }) => {
            let results = app.catalog.search(&query).await?;
            print_results(&results);
            Ok(())
        }
        Some(Commands::Load { url }) => load(&app, &url).await,
        Some(Commands::Links { url, json }) => links(&app, &url, json).await,
        None => interactive(&app, cli.query, cli.episode, cli.quality).await,
    }
}

fn print_results(results: &[SearchResult]) {
    for result in results {
        println!("{}\t{}", result.title, result.url);
    }
}

async fn home(app: &App, section: usize, page: u32) -> Result<()> {
    if section >= MAIN_PAGE.len() {
        let names: Vec<_> = MAIN_PAGE.iter().enumerate().map(|(i, (name, _))| format!("{}: {}", i, name)).collect();
        return Err(anyhow!("unknown section {}; available: {}", section, names.join(", ")));
    }

    let home = app.catalog.main_page(section, page).await?;
    println!("== {} (page {})", home.name, page);
    print_results(&home.items);
    Ok(())
}

async fn load(app: &App, url: &str) -> Result<()> {
    let show = app.catalog.load(url).await?;
    println!("{} [{:?}]", show.title, show.kind);
    if let Some(plot) = &show.plot {
        println!("{}", plot);
    }
    for (i, episode) in show.episodes.iter().enumerate() {
        println!("{:>4}. {}\t{}", i + 1, episode.name, episode.url);
    }
    Ok(())
}

async fn links(app: &App, url: &str, json: bool) -> Result<()> {
    let bar = spinner("Resolving links...");
    let loaded = app.loader.collect_links(url).await;
    bar.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&loaded)?);
        return Ok(());
    }

    if !loaded.found {
        return Err(anyhow!("no video sources on {}", url));
    }
    for link in &loaded.links {
        println!("{} [{}]\t{}", link.name, link.quality, link.url);
    }
    for subtitle in &loaded.subtitles {
        println!("subtitle: {}\t{}", subtitle.label, subtitle.url);
    }
    Ok(())
}

/// First link at the requested height, else the first link.
fn pick_link(links: &[ExtractorLink], quality: Option<u32>) -> Option<usize> {
    if links.is_empty() {
        return None;
    }
    quality
        .and_then(|h| links.iter().position(|l| l.quality.height() == Some(h)))
        .or(Some(0))
}

async fn interactive(app: &App, query: Option<String>, episode: Option<usize>, quality: Option<u32>) -> Result<()> {
    let query = match query {
        Some(q) => q,
        None => prompt_input("Search anime")?,
    };

    let bar = spinner(&format!("Searching for {}...", query));
    let results = app.catalog.search(&query).await?;
    bar.finish_and_clear();

    if results.is_empty() {
        return Err(anyhow!("no anime found for '{}'", query));
    }

    let titles: Vec<String> = results.iter().map(|r| r.title.clone()).collect();
    let selected = &results[select_from_list(&titles, "Select anime")?];

    let bar = spinner(&format!("Loading {}...", selected.title));
    let show = app.catalog.load(&selected.url).await?;
    bar.finish_and_clear();

    if show.episodes.is_empty() {
        return Err(anyhow!("no episodes found for {}", show.title));
    }

    let episode_index = match episode {
        Some(n) if n == 0 || n > show.episodes.len() => {
            return Err(anyhow!("episode {} not available, {} episodes total", n, show.episodes.len()));
        }
        Some(n) => n - 1,
        None => {
            let names: Vec<String> = show.episodes.iter().map(|e| e.name.clone()).collect();
            select_from_list(&names, "Select episode")?
        }
    };
    let episode = &show.episodes[episode_index];

    let bar = spinner(&format!("Resolving {}...", episode.name));
    let loaded = app.loader.collect_links(&episode.url).await;
    bar.finish_and_clear();

    if !loaded.found {
        return Err(anyhow!("no video sources on {}", episode.url));
    }

    let index = match quality {
        Some(_) => pick_link(&loaded.links, quality),
        None if loaded.links.len() > 1 => {
            let names: Vec<String> = loaded.links.iter().map(|l| format!("{} [{}]", l.name, l.quality)).collect();
            Some(select_from_list(&names, "Select stream")?)
        }
        None => pick_link(&loaded.links, None),
    };
    let link = index
        .and_then(|i| loaded.links.get(i))
        .ok_or_else(|| anyhow!("sources found but none resolved to a playable link"))?;

    player::play(&app.config.player, link, &loaded.subtitles)
}
