use reqwest::StatusCode;
use thiserror::Error;

use crate::model::BulkKind;

/// Failures that abort an ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no bulk data entry of kind `{0}` in the Scryfall directory")]
    BulkDataNotFound(BulkKind),
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid URL {0}")]
    InvalidUrl(String),
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("card store failure: {0:#}")]
    Store(anyhow::Error),
}

impl IngestError {
    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        IngestError::Http {
            url: url.into(),
            source,
        }
    }
}

/// Reasons a single bulk entry is skipped without failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing Scryfall id (name: {name:?})")]
    MissingId { name: Option<String> },
    #[error("card {id} has no name")]
    MissingName { id: String },
    #[error("malformed card entry: {0}")]
    Malformed(String),
}
