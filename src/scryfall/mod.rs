use anyhow::{Context, Result};
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::IngestError;
use crate::model::BulkKind;
use crate::scryfall::model::{BulkDataEntry, BulkDataList};

pub mod model;

/// Client for the Scryfall bulk-data directory and bulk downloads.
///
/// The underlying HTTP client has no request timeout: bulk files are large
/// and may take a long time to arrive.
#[derive(Clone)]
pub struct ScryfallClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for ScryfallClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScryfallClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ScryfallClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(cfg.scryfall.api_base.trim())
            .with_context(|| format!("invalid scryfall.api_base {}", cfg.scryfall.api_base))?;
        Self::with_base_url(base_url, &cfg.scryfall.user_agent)
    }

    pub fn with_base_url(base_url: Url, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("failed to build Scryfall HTTP client")?;
        Ok(Self { http, base_url })
    }

    /// Find the directory entry for `kind`. `Ok(None)` when Scryfall does not
    /// list that kind.
    #[instrument(skip(self))]
    pub async fn locate_bulk(&self, kind: BulkKind) -> Result<Option<BulkDataEntry>, IngestError> {
        let url = self
            .base_url
            .join("bulk-data")
            .map_err(|err| IngestError::InvalidUrl(format!("{}bulk-data: {}", self.base_url, err)))?;
        let list: BulkDataList = self.get_json(url).await?;

        let entry = list.data.into_iter().find(|e| e.kind == kind.as_str());
        match &entry {
            Some(e) => info!(
                kind = %kind,
                uri = %e.download_uri,
                size = ?e.size,
                updated_at = ?e.updated_at,
                "located bulk data"
            ),
            None => warn!(kind = %kind, "bulk data kind not listed"),
        }
        Ok(entry)
    }

    /// Download a bulk file and parse it as a JSON array of card objects.
    #[instrument(skip(self))]
    pub async fn fetch_bulk(&self, uri: &str) -> Result<Vec<Value>, IngestError> {
        let url = Url::parse(uri).map_err(|err| IngestError::InvalidUrl(format!("{}: {}", uri, err)))?;
        let cards: Vec<Value> = self.get_json(url).await?;
        info!(count = cards.len(), "downloaded bulk data");
        Ok(cards)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, IngestError> {
        let res = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| IngestError::http(url.as_str(), source))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, %url, body = %body, "Scryfall request failed");
            return Err(IngestError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = res
            .bytes()
            .await
            .map_err(|source| IngestError::http(url.as_str(), source))?;
        serde_json::from_slice(&body).map_err(|source| IngestError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
