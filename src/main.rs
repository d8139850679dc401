use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use feed_scraper::analytics::{self, SessionStats, SortKey};
use feed_scraper::export;
use feed_scraper::scrape::scrape_document_with;
use feed_scraper::scroll::{auto_scroll, SnapshotFeed};
use feed_scraper::{PageContext, ScraperConfig, Session, SessionStore};

const TITLE_WIDTH: usize = 60;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape posts from rendered Reddit feed pages")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, default_value = "feed_scraper.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape saved HTML and store the result as a session
    Scrape {
        /// Rendered page HTML. Several files are replayed as successive
        /// scroll positions and the settled one is scraped.
        #[arg(required = true)]
        html: Vec<PathBuf>,

        /// URL the page was rendered from
        #[arg(long, default_value = "")]
        url: String,

        /// Print the scrape result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Do not store a session
        #[arg(long, default_value_t = false)]
        no_store: bool,
    },

    /// List stored sessions
    Sessions,

    /// Show analytics for a session
    Stats {
        /// Session index (default: latest)
        #[arg(long)]
        session: Option<usize>,

        /// Only list posts whose title or author contains this text
        #[arg(long)]
        filter: Option<String>,

        /// upvotes, comments or capture
        #[arg(long, default_value_t = SortKey::Capture)]
        sort: SortKey,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Export a session's posts
    Export {
        #[arg(long)]
        session: Option<usize>,

        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete all stored sessions
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feed_scraper=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ScraperConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    match cli.command {
        Command::Scrape {
            html,
            url,
            json,
            no_store,
        } => run_scrape(&config, html, &url, json, no_store).await,
        Command::Sessions => run_sessions(&config),
        Command::Stats {
            session,
            filter,
            sort,
            json,
        } => run_stats(&config, session, filter.as_deref(), sort, json),
        Command::Export {
            session,
            format,
            output,
        } => run_export(&config, session, format, output),
        Command::Clear => {
            let mut store = load_store(&config)?;
            let removed = store.len();
            store.clear();
            store.save(&config.store_path)?;
            println!("Cleared {} sessions", removed);
            Ok(())
        }
    }
}

async fn run_scrape(
    config: &ScraperConfig,
    files: Vec<PathBuf>,
    url: &str,
    json: bool,
    no_store: bool,
) -> Result<()> {
    if !url.is_empty() {
        PageContext::parse(url)?;
    }

    let mut pages = Vec::with_capacity(files.len());
    for path in &files {
        let html = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        pages.push(html);
    }

    let cascade = config.cascade();
    let html = if pages.len() > 1 {
        let mut feed = SnapshotFeed::new(pages, cascade.clone());
        let report = auto_scroll(&mut feed, &config.scroll).await;
        info!(posts_loaded = report.posts_loaded(), "{}", report.message());
        feed.current_html().to_string()
    } else {
        pages.pop().unwrap_or_default()
    };

    let result = scrape_document_with(&cascade, &html, url);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Found {} posts in r/{} ({})",
            result.posts.len(),
            result.subreddit,
            result.strategy.as_deref().unwrap_or("no strategy matched")
        );
        if let Some(diag) = &result.diagnostics {
            println!(
                "  shreddit-post: {}, post-container: {}, article: {}, h3: {}, data-testid: {}",
                diag.shreddit_posts,
                diag.post_containers,
                diag.articles,
                diag.headings,
                diag.testid_elements
            );
            if !diag.sample_testids.is_empty() {
                println!("  sample testids: {}", diag.sample_testids.join(", "));
            }
        }
    }

    if !no_store {
        let mut store = load_store(config)?;
        let session = Session::new(result);
        let id = session.session_id.clone();
        let total = store.push(session);
        store.save(&config.store_path)?;
        if !json {
            println!("Stored {} ({} sessions)", id, total);
        }
    }
    Ok(())
}

fn run_sessions(config: &ScraperConfig) -> Result<()> {
    let store = load_store(config)?;
    if store.is_empty() {
        println!("No sessions stored");
        return Ok(());
    }

    for (i, s) in store.sessions().iter().enumerate() {
        println!(
            "{:>3}  {}  {}  r/{}  {} posts",
            i,
            s.session_id,
            s.timestamp,
            s.data.subreddit,
            s.data.posts.len()
        );
    }
    if let Some(t) = store.last_scrape_time() {
        println!("Last scrape: {}", t);
    }
    Ok(())
}

fn run_stats(
    config: &ScraperConfig,
    index: Option<usize>,
    filter: Option<&str>,
    sort: SortKey,
    json: bool,
) -> Result<()> {
    let store = load_store(config)?;
    let session = pick_session(&store, index)?;
    let posts = &session.data.posts;
    let stats = SessionStats::compute(posts);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let s = &stats.summary;
    println!("Session {} (r/{})", session.session_id, session.data.subreddit);
    println!(
        "Posts: {}  Authors: {}  Upvotes: {}  Comments: {}  Avg upvotes: {}  Avg comments: {}",
        s.total_posts, s.unique_authors, s.total_upvotes, s.total_comments, s.avg_upvotes, s.avg_comments
    );

    let e = &stats.engagement;
    println!(
        "Engagement: low {}  medium {}  high {}  viral {}",
        e.low, e.medium, e.high, e.viral
    );
    let c = &stats.comment_activity;
    println!(
        "Comments: none {}  few {}  moderate {}  many {}",
        c.none, c.few, c.moderate, c.many
    );

    println!("\nTop posts:");
    for p in &stats.top_posts {
        println!("  {:>7}  {}", p.upvotes, analytics::truncate(&p.title, TITLE_WIDTH));
    }

    println!("\nTop authors:");
    for a in &stats.top_authors {
        println!("  {:>3}  {}", a.posts, a.author);
    }

    println!("\nUsers:");
    for u in &stats.user_stats {
        println!(
            "  {:<24} posts {:>3}  upvotes {:>7} (avg {})  comments {:>6} (avg {})",
            u.author, u.posts, u.total_upvotes, u.avg_upvotes, u.total_comments, u.avg_comments
        );
    }

    let mut listed: Vec<_> = match filter {
        Some(q) => analytics::filter_posts(posts, q).into_iter().cloned().collect(),
        None => posts.clone(),
    };
    analytics::sort_posts(&mut listed, sort);

    println!("\nPosts ({}, by {}):", listed.len(), sort);
    for p in &listed {
        println!(
            "  {:>7} {:>6}  {:<20}  {}",
            p.upvotes,
            p.comments,
            analytics::truncate(&p.author, 20),
            analytics::truncate(&p.title, TITLE_WIDTH)
        );
    }
    Ok(())
}

fn run_export(
    config: &ScraperConfig,
    index: Option<usize>,
    format: Format,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = load_store(config)?;
    let session = pick_session(&store, index)?;
    let posts = &session.data.posts;

    match output {
        Some(path) => {
            let file = fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            let writer = io::BufWriter::new(file);
            match format {
                Format::Csv => export::write_csv(writer, posts, &session.timestamp)?,
                Format::Json => export::write_json(writer, posts)?,
            }
            info!(path = %path.display(), posts = posts.len(), "exported");
        }
        None => match format {
            Format::Csv => print!("{}", export::to_csv(posts, &session.timestamp)),
            Format::Json => println!("{}", export::to_json(posts)?),
        },
    }
    Ok(())
}

fn load_store(config: &ScraperConfig) -> Result<SessionStore> {
    SessionStore::load(&config.store_path, config.session_cap)
        .with_context(|| format!("loading sessions from {}", config.store_path.display()))
}

fn pick_session(store: &SessionStore, index: Option<usize>) -> Result<&Session> {
    match index {
        Some(i) => Ok(store.get(i)?),
        None => match store.latest() {
            Some(s) => Ok(s),
            None => bail!("no sessions stored; run `feed-scraper scrape` first"),
        },
    }
}
