//! Transactional card store used by the ingest pipeline.
//!
//! `stage` writes into an open transaction that is begun lazily and kept
//! until `commit` or `rollback`. Nothing staged is durable before `commit`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::db::{self, NewCard, Pool};

#[async_trait]
pub trait CardStore: Send + Sync {
    /// Whether a card with this Scryfall id is already stored.
    async fn exists(&self, scryfall_id: &str) -> Result<bool>;

    /// Add a card to the open transaction.
    async fn stage(&self, card: NewCard) -> Result<()>;

    /// Durably persist everything staged since the last commit or rollback.
    async fn commit(&self) -> Result<()>;

    /// Discard everything staged since the last commit.
    async fn rollback(&self) -> Result<()>;
}

pub struct SqliteCardStore {
    pool: Pool,
    tx: Mutex<Option<Transaction<'static, Sqlite>>>,
}

impl SqliteCardStore {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            tx: Mutex::new(None),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl CardStore for SqliteCardStore {
    async fn exists(&self, scryfall_id: &str) -> Result<bool> {
        // Lookups share the writer's connection while a transaction is open.
        let mut guard = self.tx.lock().await;
        if let Some(tx) = guard.as_mut() {
            return db::card_exists(&mut **tx, scryfall_id).await;
        }
        drop(guard);

        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire connection")?;
        db::card_exists(&mut conn, scryfall_id).await
    }

    async fn stage(&self, card: NewCard) -> Result<()> {
        let mut guard = self.tx.lock().await;
        let tx = match guard.take() {
            Some(tx) => tx,
            None => self
                .pool
                .begin()
                .await
                .context("failed to begin transaction")?,
        };
        let tx = guard.insert(tx);
        if !db::insert_card(&mut **tx, &card).await? {
            debug!(scryfall_id = %card.scryfall_id, "card already stored; insert ignored");
        }
        Ok(())
    }

    #[instrument(skip_all)]
    async fn commit(&self) -> Result<()> {
        let tx = self.tx.lock().await.take();
        if let Some(tx) = tx {
            tx.commit().await.context("failed to commit card batch")?;
        }
        Ok(())
    }

    #[instrument(skip_all)]
    async fn rollback(&self) -> Result<()> {
        let tx = self.tx.lock().await.take();
        if let Some(tx) = tx {
            tx.rollback()
                .await
                .context("failed to roll back card batch")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn setup_store() -> SqliteCardStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteCardStore::new(pool)
    }

    fn card(id: &str) -> NewCard {
        NewCard {
            scryfall_id: id.into(),
            name: format!("Card {id}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn commit_makes_staged_cards_durable() {
        let store = setup_store().await;
        store.stage(card("a")).await.unwrap();
        store.stage(card("b")).await.unwrap();
        store.commit().await.unwrap();

        assert_eq!(db::count_cards(store.pool()).await.unwrap(), 2);
        assert!(store.exists("a").await.unwrap());
        assert!(!store.exists("c").await.unwrap());
    }

    #[tokio::test]
    async fn rollback_discards_only_uncommitted_cards() {
        let store = setup_store().await;
        store.stage(card("kept")).await.unwrap();
        store.commit().await.unwrap();

        store.stage(card("lost")).await.unwrap();
        store.rollback().await.unwrap();

        assert!(store.exists("kept").await.unwrap());
        assert!(!store.exists("lost").await.unwrap());
        assert_eq!(db::count_cards(store.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn commit_and_rollback_without_staging_are_noops() {
        let store = setup_store().await;
        store.commit().await.unwrap();
        store.rollback().await.unwrap();
        assert_eq!(db::count_cards(store.pool()).await.unwrap(), 0);
    }
}
