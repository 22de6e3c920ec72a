use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use card_ingest::assets::HttpImageSource;
use card_ingest::config;
use card_ingest::db;
use card_ingest::model::BulkKind;
use card_ingest::pipeline;
use card_ingest::scryfall::ScryfallClient;
use card_ingest::store::SqliteCardStore;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Download Scryfall bulk data and store every new card with its images"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Bulk dataset to ingest (overrides ingest.bulk_type)
    #[arg(long, value_enum)]
    bulk_type: Option<BulkKind>,

    /// Cards processed concurrently (overrides ingest.window)
    #[arg(long)]
    window: Option<usize>,

    /// Commit after this many processed cards (overrides ingest.commit_every)
    #[arg(long)]
    commit_every: Option<usize>,

    /// Store image URIs without downloading the images
    #[arg(long)]
    no_images: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let mut settings = cfg.ingest_settings();
    if let Some(kind) = args.bulk_type {
        settings.bulk_type = kind;
    }
    if let Some(window) = args.window {
        settings.window = window;
    }
    if let Some(commit_every) = args.commit_every {
        settings.commit_every = commit_every;
    }
    if args.no_images {
        settings.download_images = false;
    }
    if settings.window == 0 || settings.commit_every == 0 {
        return Err(anyhow!("--window and --commit-every must be > 0"));
    }

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    let store = SqliteCardStore::new(pool);

    let client = ScryfallClient::from_config(&cfg)?;
    let images = HttpImageSource::new(&cfg.scryfall.user_agent, settings.image_timeout)?;

    let summary = pipeline::run(&settings, &client, &store, &images).await?;
    info!(
        total = summary.total,
        staged = summary.staged,
        already_stored = summary.already_stored,
        rejected = summary.rejected,
        commits = summary.commits,
        "card population finished"
    );
    Ok(())
}
