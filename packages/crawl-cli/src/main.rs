//! Operator CLI for the crawl library.
//!
//! Loads `.env`, puts the Firecrawl key into the process-wide credential
//! store, and prints canonical results as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use site_crawl::{
    CanonicalCrawlResult, CrawlOptions, CrawlRequest, CrawlService, CredentialStore,
    FirecrawlClient, FirecrawlConfig, PostgresStore, RecordStore, SqliteStore, UrlRole,
};

#[derive(Parser)]
#[command(name = "crawl-cli")]
#[command(about = "Scrape and crawl websites through Firecrawl and inspect stored results")]
struct Cli {
    /// Firecrawl API key
    #[arg(long, env = "FIRECRAWL_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Where results are stored (sqlite:// or postgres://)
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://crawl-results.db?mode=rwc",
        global = true
    )]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a single page
    Scrape {
        url: String,
        #[command(flatten)]
        target: Target,
    },

    /// Crawl a site
    Crawl {
        url: String,
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 2)]
        max_depth: u32,
        #[arg(long, default_value_t = 50)]
        max_pages: u32,
        #[arg(long)]
        include_external_links: bool,
        /// CSS selector to restrict extraction (repeatable)
        #[arg(long = "selector")]
        selectors: Vec<String>,
    },

    /// Show the most recent stored result
    Latest {
        owner: String,
        #[arg(long, default_value = "primary")]
        role: UrlRole,
    },

    /// Show all stored results, most recent first
    History {
        owner: String,
        #[arg(long, default_value = "primary")]
        role: UrlRole,
    },

    /// Check that the API key is accepted
    CheckKey,
}

#[derive(Args)]
struct Target {
    /// Save successful results under this owner id
    #[arg(long)]
    owner: Option<String>,

    #[arg(long, default_value = "primary")]
    role: UrlRole,
}

#[derive(Serialize)]
struct KeyCheck {
    valid: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load before parsing so clap sees .env values
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Some(key) = cli.api_key.as_deref() {
        CredentialStore::global()
            .set(key)
            .context("FIRECRAWL_API_KEY is set but empty")?;
    }

    let config = FirecrawlConfig::from_env().context("Invalid Firecrawl configuration")?;
    let client = FirecrawlClient::with_config(config.clone()).context("Failed to build HTTP client")?;

    if cli.database_url.starts_with("postgres") {
        let store = PostgresStore::new(&cli.database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        run(cli.command, CrawlService::new(client, store).with_poll_config(&config)).await
    } else {
        let store = SqliteStore::new(&cli.database_url)
            .await
            .context("Failed to open SQLite database")?;
        run(cli.command, CrawlService::new(client, store).with_poll_config(&config)).await
    }
}

async fn run<S: RecordStore>(
    command: Commands,
    service: CrawlService<FirecrawlClient, S>,
) -> Result<ExitCode> {
    let credentials = CredentialStore::global();

    match command {
        Commands::Scrape { url, target } => {
            let request = CrawlRequest::new(url).with_role(target.role);
            let result = service
                .scrape_page(&request, credentials, target.owner.as_deref())
                .await;
            print_result(&result)
        }
        Commands::Crawl {
            url,
            target,
            max_depth,
            max_pages,
            include_external_links,
            selectors,
        } => {
            let mut options = CrawlOptions::default()
                .with_max_depth(max_depth)
                .with_max_pages(max_pages)
                .with_external_links(include_external_links);
            for selector in selectors {
                options = options.with_selector(selector);
            }
            let request = CrawlRequest::new(url)
                .with_role(target.role)
                .with_options(options);
            let result = service
                .crawl_site(&request, credentials, target.owner.as_deref())
                .await;
            print_result(&result)
        }
        Commands::Latest { owner, role } => match service.latest(&owner, role).await {
            Some(result) => print_result(&result),
            None => {
                tracing::warn!(owner = %owner, role = %role, "No stored result");
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::History { owner, role } => {
            let results = service.history(&owner, role).await;
            print_json(&results)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckKey => {
            let valid = service.test_connection(credentials).await;
            print_json(&KeyCheck { valid })?;
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn print_result(result: &CanonicalCrawlResult) -> Result<ExitCode> {
    print_json(result)?;
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_crawl_options() {
        let cli = Cli::try_parse_from([
            "crawl-cli",
            "crawl",
            "https://example.com",
            "--owner",
            "s1",
            "--role",
            "referenced",
            "--max-pages",
            "10",
            "--selector",
            "main",
            "--selector",
            "article",
        ])
        .unwrap();

        match cli.command {
            Commands::Crawl {
                url,
                target,
                max_pages,
                max_depth,
                selectors,
                ..
            } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(target.owner.as_deref(), Some("s1"));
                assert_eq!(target.role, UrlRole::Referenced);
                assert_eq!(max_pages, 10);
                assert_eq!(max_depth, 2);
                assert_eq!(selectors, vec!["main", "article"]);
            }
            _ => panic!("expected crawl command"),
        }
    }
}
