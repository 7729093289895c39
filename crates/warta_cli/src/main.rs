use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use warta_core::{regions, ArticleQuery, ArticleStorage, Error, Result};
use warta_scraper::browser::{launcher_for, Engine};
use warta_scraper::config::BrowserOptions;
use warta_scraper::logging::init_logging;
use warta_scraper::{handle_command, ScraperArgs, ScraperManager};
use warta_web::AppState;

/// Interval such as `30m`, `1h` or `1h15m30s`; a bare number is seconds.
#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut digits = String::new();
        let mut seen_value = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let value: u64 = digits
                .parse()
                .map_err(|_| format!("Expected a number before '{}'", c))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds = value
                .checked_mul(unit)
                .and_then(|seconds| total_seconds.checked_add(seconds))
                .ok_or_else(|| "Duration is too long".to_string())?;
            digits.clear();
            seen_value = true;
        }

        if !digits.is_empty() {
            let seconds = digits
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(seconds)
                .ok_or_else(|| "Duration is too long".to_string())?;
            seen_value = true;
        }

        if !seen_value || total_seconds == 0 {
            return Err("Duration must be a positive amount of time".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Harvest dated news articles from listing pages", long_about = None)]
struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "memory", global = true)]
    storage: String,

    /// SQLite database file
    #[arg(long, default_value = "articles.db", global = true)]
    database: PathBuf,

    /// How pages are loaded
    #[arg(long, value_enum, default_value_t = Engine::Browser, global = true)]
    engine: Engine,

    /// Chromium/Chrome executable (auto-detected when omitted)
    #[arg(long, global = true)]
    chrome: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl one listing page and store the articles inside the date range
    Scrape {
        #[command(flatten)]
        args: ScraperArgs,

        /// Repeat the crawl with this interval (e.g. 30m, 1h, 1d)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3001")]
        bind: SocketAddr,
    },
    /// Inspect or clean up stored articles
    Articles {
        #[command(subcommand)]
        command: ArticleCommands,
    },
    /// Print the province table
    Provinces,
}

#[derive(Subcommand, Debug)]
enum ArticleCommands {
    List {
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long)]
        search: Option<String>,
    },
    Delete {
        id: i64,
    },
    Clear,
    Export,
}

async fn check_storage(storage: &Arc<dyn ArticleStorage>, storage_type: &str) -> Result<()> {
    let count = storage.count().await?;
    info!("🏦 Storage backend ready (using {}, {} articles)", storage_type, count);
    Ok(())
}

async fn check_storage_with_retry(
    storage: &Arc<dyn ArticleStorage>,
    storage_type: &str,
    max_retries: u32,
    timeout: Duration,
) -> Result<()> {
    let mut retries = 0;
    let mut last_error = None;

    while retries < max_retries {
        match tokio::time::timeout(timeout, check_storage(storage, storage_type)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => last_error = Some(e),
            Err(elapsed) => {
                last_error = Some(Error::Storage(format!("Storage health check timed out: {}", elapsed)));
            }
        }
        retries += 1;
        if retries < max_retries {
            info!("Storage health check failed, retrying {}/{}...", retries, max_retries);
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    Err(last_error
        .unwrap_or_else(|| Error::Storage("Storage health check failed after all retries".to_string())))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn scraper_manager(cli: &Cli, storage: Arc<dyn ArticleStorage>) -> Result<ScraperManager> {
    let options = BrowserOptions {
        headless: !cli.headed,
        chrome_executable: cli.chrome.clone(),
        ..Default::default()
    };
    let launcher = launcher_for(cli.engine, options)?;
    info!("🦗 Scraper ready (engine: {:?})", cli.engine);
    Ok(ScraperManager::new(storage, launcher))
}

async fn run_articles(command: ArticleCommands, storage: Arc<dyn ArticleStorage>) -> anyhow::Result<()> {
    match command {
        ArticleCommands::List { limit, search } => {
            let query = ArticleQuery {
                limit: limit.clamp(1, warta_core::MAX_PAGE_SIZE),
                search,
                ..Default::default()
            };
            print_json(&storage.find_all(&query).await?)?;
        }
        ArticleCommands::Delete { id } => match storage.delete_by_id(id).await? {
            Some(article) => info!("🗑️ Deleted article {}: {}", article.id, article.url),
            None => anyhow::bail!("Article not found: {}", id),
        },
        ArticleCommands::Clear => {
            let deleted = storage.delete_all().await?;
            info!("🗑️ {} articles deleted", deleted);
        }
        ArticleCommands::Export => print_json(&storage.export_all().await?)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Provinces = cli.command {
        return print_json(regions::provinces());
    }

    let storage = warta_storage::create_storage(&cli.storage, Some(cli.database.as_path())).await?;
    info!("💾 Checking storage connection...");
    check_storage_with_retry(&storage, &cli.storage, 3, Duration::from_secs(10)).await?;

    match cli.command {
        Commands::Scrape { ref args, ref interval } => {
            let manager = scraper_manager(&cli, storage)?;
            match interval {
                Some(interval) => {
                    info!("Running in periodic mode with {}s interval", interval.0.as_secs());
                    loop {
                        info!("Starting scrape cycle");
                        match handle_command(args.clone(), &manager).await {
                            Ok(result) => print_json(&result)?,
                            Err(e) => error!("Error during scrape: {}", e),
                        }
                        info!("Waiting {}s before next scrape", interval.0.as_secs());
                        tokio::time::sleep(interval.0).await;
                    }
                }
                None => print_json(&handle_command(args.clone(), &manager).await?)?,
            }
        }
        Commands::Serve { bind } => {
            let manager = scraper_manager(&cli, storage)?;
            warta_web::serve(AppState::new(manager), bind).await?;
        }
        Commands::Articles { command } => run_articles(command, storage).await?,
        Commands::Provinces => {}
    }

    Ok(())
}
