use super::model::{CardDefinition, NewCard};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized)
        .await
        .with_context(|| format!("failed to open database {}", normalized))?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    // Rebuild URL, prefer sqlite:// form; create the file on first open.
    let mut rebuilt = format!("sqlite://{}", expanded_path);
    match query_part {
        Some(q) if q.contains("mode=") => {
            rebuilt.push('?');
            rebuilt.push_str(q);
        }
        Some(q) => {
            rebuilt.push('?');
            rebuilt.push_str(q);
            rebuilt.push_str("&mode=rwc");
        }
        None => rebuilt.push_str("?mode=rwc"),
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn card_exists(conn: &mut SqliteConnection, scryfall_id: &str) -> Result<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM card_definitions WHERE scryfall_id = ?")
        .bind(scryfall_id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

/// Insert a card unless its Scryfall id is already stored. Returns whether a row was written.
pub async fn insert_card(conn: &mut SqliteConnection, card: &NewCard) -> Result<bool> {
    let legalities = card
        .legalities
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .with_context(|| format!("failed to encode legalities of {}", card.scryfall_id))?;
    let now = Utc::now();
    let res = sqlx::query(
        "INSERT INTO card_definitions (
            scryfall_id, name, set_code, collector_number, legalities, type_line,
            image_uri_small, image_uri_normal, image_uri_large,
            image_uri_art_crop, image_uri_border_crop,
            image_data_small, image_data_normal, image_data_large,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(scryfall_id) DO NOTHING",
    )
    .bind(card.scryfall_id.as_str())
    .bind(card.name.as_str())
    .bind(card.set_code.as_deref())
    .bind(card.collector_number.as_deref())
    .bind(legalities)
    .bind(card.type_line.as_deref())
    .bind(card.image_uri_small.as_deref())
    .bind(card.image_uri_normal.as_deref())
    .bind(card.image_uri_large.as_deref())
    .bind(card.image_uri_art_crop.as_deref())
    .bind(card.image_uri_border_crop.as_deref())
    .bind(card.image_data_small.as_deref())
    .bind(card.image_data_normal.as_deref())
    .bind(card.image_data_large.as_deref())
    .bind(now)
    .bind(now)
    .execute(conn)
    .await
    .with_context(|| format!("failed to insert card {}", card.scryfall_id))?;
    Ok(res.rows_affected() == 1)
}

/// Fetch a stored card with all of its columns in one query.
#[instrument(skip_all)]
pub async fn get_card_by_scryfall_id(pool: &Pool, scryfall_id: &str) -> Result<Option<CardDefinition>> {
    let row = sqlx::query(
        "SELECT id, scryfall_id, name, set_code, collector_number, legalities, type_line,
                image_uri_small, image_uri_normal, image_uri_large,
                image_uri_art_crop, image_uri_border_crop,
                image_data_small, image_data_normal, image_data_large,
                created_at, updated_at
         FROM card_definitions WHERE scryfall_id = ?",
    )
    .bind(scryfall_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| card_from_row(&row)).transpose()
}

#[instrument(skip_all)]
pub async fn count_cards(pool: &Pool) -> Result<i64> {
    let cnt: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM card_definitions")
        .fetch_one(pool)
        .await?;
    Ok(cnt)
}

fn card_from_row(row: &SqliteRow) -> Result<CardDefinition> {
    let scryfall_id: String = row.get("scryfall_id");
    let legalities = row
        .get::<Option<String>, _>("legalities")
        .map(|raw| serde_json::from_str::<BTreeMap<String, String>>(&raw))
        .transpose()
        .map_err(|err| anyhow!("card {} has unreadable legalities: {}", scryfall_id, err))?;

    Ok(CardDefinition {
        id: row.get("id"),
        card: NewCard {
            name: row.get("name"),
            set_code: row.get("set_code"),
            collector_number: row.get("collector_number"),
            legalities,
            type_line: row.get("type_line"),
            image_uri_small: row.get("image_uri_small"),
            image_uri_normal: row.get("image_uri_normal"),
            image_uri_large: row.get("image_uri_large"),
            image_uri_art_crop: row.get("image_uri_art_crop"),
            image_uri_border_crop: row.get("image_uri_border_crop"),
            image_data_small: row.get("image_data_small"),
            image_data_normal: row.get("image_data_normal"),
            image_data_large: row.get("image_data_large"),
            scryfall_id,
        },
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}
