use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use review_board::{AttachmentStore, Config, ReviewRepository, ReviewStore};

#[derive(Parser)]
#[command(name = "review-board")]
#[command(about = "Flat-file review board service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(long, env = "REVIEW_BOARD_CONFIG", default_value = "review-board.yml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// List all stored reviews
    List,

    /// Show a single review as JSON
    Show {
        /// Review identifier
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("review_board=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { bind } => serve(config, bind).await,
        Commands::List => list_reviews(&config),
        Commands::Show { id } => show_review(&config, id),
    }
}

fn open_repository(config: &Config) -> Result<Arc<ReviewRepository>> {
    let store = ReviewStore::open(config.reviews_file()).context("Failed to open review store")?;

    let attachments = AttachmentStore::open(
        &config.storage.upload_dir,
        &config.uploads.public_prefix,
        config.uploads.max_bytes,
    )
    .context("Failed to open upload directory")?;

    let repository =
        ReviewRepository::open(store, attachments).context("Failed to load reviews")?;

    Ok(Arc::new(repository))
}

async fn serve(mut config: Config, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(addr) = bind {
        config.server.bind_addr = addr;
    }

    let repository = open_repository(&config)?;

    review_board::http::serve(&config, repository).await
}

fn list_reviews(config: &Config) -> Result<()> {
    let repository = open_repository(config)?;
    let reviews = repository.list_all();

    if reviews.is_empty() {
        println!("No reviews.");
        return Ok(());
    }

    for review in reviews {
        println!("{}  {}  by {}  ({})", review.id, review.title, review.author, review.date);
        if review.has_attachment() {
            println!("    image: {}", review.hero_image_url);
        }
    }

    Ok(())
}

fn show_review(config: &Config, id: Uuid) -> Result<()> {
    let repository = open_repository(config)?;
    let review = repository
        .find_by_id(&id)
        .with_context(|| format!("No review with id {}", id))?;

    println!("{}", serde_json::to_string_pretty(&review)?);

    Ok(())
}
