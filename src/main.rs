use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rcfeed::config::{Config, FeedSet};
use rcfeed::delivery::{dispatch, DispatchReport, WebhookClient};
use rcfeed::feed::{FeedConfig, FeedFormatter};
use rcfeed::output::terminal;
use rcfeed::wiki::{parse_events, ChangeEvent};

/// rcfeed: post wiki recent changes to chat webhooks.
///
/// Reads change events as JSON, renders them per configured feed, and
/// posts the result to each feed's webhook URLs.
#[derive(Parser)]
#[command(name = "rcfeed", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch events to every configured feed
    Send {
        /// Event file (JSON array, single object, or JSON lines); stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the payload each feed would post, without sending
    Render {
        /// Event file (JSON array, single object, or JSON lines); stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,

        /// Only render for this feed
        #[arg(long)]
        feed: Option<String>,
    },

    /// Load the configuration and print the normalized feeds
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rcfeed=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send { file } => {
            let config = Config::load()?;
            let set = config.load_feeds()?;
            let catalog = config.load_catalog()?;
            let events = read_events(file.as_deref())?;
            info!(
                events = events.len(),
                feeds = set.feeds.len(),
                "Dispatching events"
            );

            let client = WebhookClient::new(config.timeout)?;
            let formatter = FeedFormatter::new(&set.site, &catalog);

            let mut total = DispatchReport::default();
            for event in &events {
                let report =
                    dispatch(event, &set.feeds, &formatter, &client, config.concurrency).await;
                total.merge(report);
            }
            terminal::display_dispatch_report(events.len(), &total);
        }

        Commands::Render { file, feed } => {
            let config = Config::load()?;
            let set = config.load_feeds()?;
            let catalog = config.load_catalog()?;
            let events = read_events(file.as_deref())?;
            let feeds = select_feeds(&set, feed.as_deref())?;
            let formatter = FeedFormatter::new(&set.site, &catalog);

            for (i, event) in events.iter().enumerate() {
                println!("\n#{} {} {}", i + 1, event.kind, event.title);
                for feed in &feeds {
                    terminal::display_outcome(feed, &formatter.format(event, feed));
                }
            }
        }

        Commands::Check => {
            let config = Config::load()?;
            let set = config.load_feeds()?;
            let catalog = config.load_catalog()?;
            terminal::display_feed_summary(&set);
            println!("  {} messages loaded", catalog.len());
        }
    }

    Ok(())
}

/// Read events from a file, or from stdin when no file is given.
fn read_events(file: Option<&Path>) -> Result<Vec<ChangeEvent>> {
    let input = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read events from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read events from stdin")?;
            buf
        }
    };
    parse_events(&input)
}

fn select_feeds<'s>(set: &'s FeedSet, name: Option<&str>) -> Result<Vec<&'s FeedConfig>> {
    match name {
        Some(name) => {
            let feed = set
                .feed(name)
                .with_context(|| format!("No feed named {name:?}"))?;
            Ok(vec![feed])
        }
        None => Ok(set.feeds.iter().collect()),
    }
}
