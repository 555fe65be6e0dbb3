use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use topical::{cli, config, scrape, server};

#[derive(Parser)]
#[command(name = "topical", version, about = "Semantic Q&A over a scraped forum corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Build the embedding cache snapshot ahead of serving
    Embed {
        /// Rebuild even if a matching snapshot exists
        #[arg(long)]
        force: bool,
    },
    /// Ask a one-off question from the terminal
    Ask { question: String },
    /// Scrape the forum into the corpus file
    Scrape {
        /// First creation date to include (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last creation date to include (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Output path (defaults to the configured corpus file)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::TopicalConfig::load()?;

    // Initialize tracing with the configured log level, logging to stderr.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Embed { force } => {
            cli::embed::embed(&config, force).await?;
        }
        Command::Ask { question } => {
            cli::ask::ask(&config, &question).await?;
        }
        Command::Scrape { start, end, out } => {
            let window = scrape::DateWindow::new(start, end)?;
            let out_path = out.unwrap_or_else(|| config.resolved_posts_path());
            let count = scrape::scrape_to_file(&config.corpus.base_url, &window, &out_path).await?;
            println!("Saved {count} posts to {}", out_path.display());
        }
    }

    Ok(())
}
