//! Best-effort card image downloads.
//!
//! A failed download never fails the card: the binary stays empty and the
//! URI for that size is dropped so the stored card does not advertise an
//! image it does not have.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, warn};

use crate::model::ImageSize;

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Image downloader sharing one HTTP client across all concurrent fetches.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    http: Client,
}

impl HttpImageSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("failed to build image HTTP client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let res = self
            .http
            .get(uri)
            .header(header::ACCEPT, "image/*")
            .send()
            .await
            .with_context(|| format!("failed to reach {}", uri))?;
        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("image request {} answered {}", uri, status));
        }
        let body = res
            .bytes()
            .await
            .with_context(|| format!("failed to read image body from {}", uri))?;
        Ok(body.to_vec())
    }
}

/// Image URIs to try for one card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRequest {
    pub small: Option<String>,
    pub normal: Option<String>,
    pub large: Option<String>,
}

impl ImageRequest {
    pub fn uri(&self, size: ImageSize) -> Option<&str> {
        match size {
            ImageSize::Small => self.small.as_deref(),
            ImageSize::Normal => self.normal.as_deref(),
            ImageSize::Large => self.large.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub uri: String,
    pub data: Vec<u8>,
}

/// Outcome of fetching the images of one card. `None` means the size had no
/// URI or its download failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedImages {
    pub small: Option<Image>,
    pub normal: Option<Image>,
    pub large: Option<Image>,
}

/// Fetch every present size of `request` concurrently. Never fails.
pub async fn fetch_images(
    source: &dyn ImageSource,
    scryfall_id: &str,
    request: &ImageRequest,
) -> FetchedImages {
    let (small, normal, large) = futures::join!(
        fetch_one(source, scryfall_id, ImageSize::Small, request.uri(ImageSize::Small)),
        fetch_one(source, scryfall_id, ImageSize::Normal, request.uri(ImageSize::Normal)),
        fetch_one(source, scryfall_id, ImageSize::Large, request.uri(ImageSize::Large)),
    );
    FetchedImages {
        small,
        normal,
        large,
    }
}

async fn fetch_one(
    source: &dyn ImageSource,
    scryfall_id: &str,
    size: ImageSize,
    uri: Option<&str>,
) -> Option<Image> {
    let uri = uri?;
    match source.fetch(uri).await {
        Ok(data) => {
            debug!(scryfall_id, size = size.as_str(), bytes = data.len(), "image fetched");
            Some(Image {
                uri: uri.to_string(),
                data,
            })
        }
        Err(err) => {
            warn!(?err, scryfall_id, size = size.as_str(), uri, "image fetch failed; dropping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedImages(HashMap<&'static str, Result<Vec<u8>, &'static str>>);

    #[async_trait]
    impl ImageSource for FixedImages {
        async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
            match self.0.get(uri) {
                Some(Ok(bytes)) => Ok(bytes.clone()),
                Some(Err(msg)) => Err(anyhow!("{}", msg)),
                None => Err(anyhow!("unexpected uri {}", uri)),
            }
        }
    }

    #[tokio::test]
    async fn failed_size_is_dropped_others_kept() {
        let source = FixedImages(HashMap::from([
            ("s", Err("404 Not Found")),
            ("n", Ok(vec![1, 2])),
            ("l", Ok(vec![3, 4, 5])),
        ]));
        let request = ImageRequest {
            small: Some("s".into()),
            normal: Some("n".into()),
            large: Some("l".into()),
        };

        let fetched = fetch_images(&source, "card-1", &request).await;
        assert!(fetched.small.is_none());
        assert_eq!(fetched.normal.unwrap().data, vec![1, 2]);
        let large = fetched.large.unwrap();
        assert_eq!(large.uri, "l");
        assert_eq!(large.data, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn missing_uris_are_not_fetched() {
        let source = FixedImages(HashMap::new());
        let fetched = fetch_images(&source, "card-2", &ImageRequest::default()).await;
        assert_eq!(fetched, FetchedImages::default());
    }
}
