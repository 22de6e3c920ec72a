use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use card_ingest::config;
use card_ingest::db;

#[derive(Parser, Debug)]
#[command(about = "Print a stored card by its Scryfall id")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Scryfall id of the card
    #[arg(long)]
    scryfall_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = config::load(Some(&args.config))?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let pool = db::init_pool(&database_url).await?;

    let stored = db::get_card_by_scryfall_id(&pool, &args.scryfall_id)
        .await?
        .ok_or_else(|| anyhow!("card {} is not stored", args.scryfall_id))?;
    let card = &stored.card;

    println!("id:               {}", stored.id);
    println!("scryfall_id:      {}", card.scryfall_id);
    println!("name:             {}", card.name);
    println!("set:              {}", card.set_code.as_deref().unwrap_or("-"));
    println!("collector number: {}", card.collector_number.as_deref().unwrap_or("-"));
    println!("type line:        {}", card.type_line.as_deref().unwrap_or("-"));
    println!("created at:       {}", stored.created_at);
    println!("updated at:       {}", stored.updated_at);
    if let Some(legalities) = &card.legalities {
        println!("legalities:");
        for (format, status) in legalities {
            println!("  {:<16} {}", format, status);
        }
    }
    println!("images:");
    for (size, uri, data) in [
        ("small", &card.image_uri_small, &card.image_data_small),
        ("normal", &card.image_uri_normal, &card.image_data_normal),
        ("large", &card.image_uri_large, &card.image_data_large),
    ] {
        println!(
            "  {:<11} {} ({} bytes)",
            size,
            uri.as_deref().unwrap_or("-"),
            data.as_ref().map(Vec::len).unwrap_or(0)
        );
    }
    for (kind, uri) in [
        ("art_crop", &card.image_uri_art_crop),
        ("border_crop", &card.image_uri_border_crop),
    ] {
        println!("  {:<11} {}", kind, uri.as_deref().unwrap_or("-"));
    }
    Ok(())
}
