//! Decoding of raw Scryfall card objects and mapping into stored cards.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::assets::{FetchedImages, Image, ImageRequest};
use crate::db::NewCard;
use crate::error::Rejection;

/// The subset of a Scryfall card object the pipeline stores. Unknown fields
/// are ignored; every field is optional at decode time.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawCard {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "set")]
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    pub legalities: Option<BTreeMap<String, String>>,
    pub type_line: Option<String>,
    pub image_uris: Option<ImageUris>,
    pub card_faces: Option<Vec<CardFace>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ImageUris {
    pub small: Option<String>,
    pub normal: Option<String>,
    pub large: Option<String>,
    pub art_crop: Option<String>,
    pub border_crop: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CardFace {
    pub image_uris: Option<ImageUris>,
}

/// Decode one bulk entry. Entries whose shape does not match are rejected.
pub fn decode(value: Value) -> Result<RawCard, Rejection> {
    serde_json::from_value(value).map_err(|err| Rejection::Malformed(err.to_string()))
}

impl RawCard {
    /// The Scryfall id, required for deduplication.
    pub fn scryfall_id(&self) -> Result<&str, Rejection> {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(Rejection::MissingId {
                name: self.name.clone(),
            }),
        }
    }

    /// Check the fields a stored card cannot do without.
    pub fn validate(&self) -> Result<(), Rejection> {
        let id = self.scryfall_id()?;
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(Rejection::MissingName { id: id.to_string() }),
        }
    }

    /// Image URIs of the card, falling back to the first face that has some.
    pub fn image_uris(&self) -> Option<&ImageUris> {
        self.image_uris.as_ref().or_else(|| {
            self.card_faces
                .as_deref()
                .unwrap_or_default()
                .iter()
                .find_map(|face| face.image_uris.as_ref())
        })
    }

    pub fn image_request(&self) -> ImageRequest {
        self.image_uris()
            .map(|uris| ImageRequest {
                small: uris.small.clone(),
                normal: uris.normal.clone(),
                large: uris.large.clone(),
            })
            .unwrap_or_default()
    }
}

/// Map a validated card and its image downloads into the stored shape.
///
/// `images` is `None` when image downloads are disabled; the URIs are then
/// kept as-is without binaries.
pub fn build(raw: RawCard, images: Option<FetchedImages>) -> Result<NewCard, Rejection> {
    raw.validate()?;
    let uris = raw.image_uris().cloned().unwrap_or_default();

    let mut card = NewCard {
        scryfall_id: raw.scryfall_id()?.to_string(),
        name: raw.name.as_deref().map(str::trim).unwrap_or_default().to_string(),
        image_uri_art_crop: uris.art_crop,
        image_uri_border_crop: uris.border_crop,
        ..Default::default()
    };

    match images {
        Some(fetched) => {
            (card.image_uri_small, card.image_data_small) = split(fetched.small);
            (card.image_uri_normal, card.image_data_normal) = split(fetched.normal);
            (card.image_uri_large, card.image_data_large) = split(fetched.large);
        }
        None => {
            card.image_uri_small = uris.small;
            card.image_uri_normal = uris.normal;
            card.image_uri_large = uris.large;
        }
    }

    card.set_code = raw.set_code;
    card.collector_number = raw.collector_number;
    card.legalities = raw.legalities;
    card.type_line = raw.type_line;
    Ok(card)
}

fn split(image: Option<Image>) -> (Option<String>, Option<Vec<u8>>) {
    match image {
        Some(Image { uri, data }) => (Some(uri), Some(data)),
        None => (None, None),
    }
}
