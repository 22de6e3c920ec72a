//! Database entity models used by repositories.
//!
//! Keep these structs focused on the data stored in `card_definitions`.
//! Business logic should live in higher layers.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A card as it is inserted. Image URIs for small/normal/large are only set
/// when the matching binary was downloaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCard {
    pub scryfall_id: String,
    pub name: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    pub legalities: Option<BTreeMap<String, String>>,
    pub type_line: Option<String>,
    pub image_uri_small: Option<String>,
    pub image_uri_normal: Option<String>,
    pub image_uri_large: Option<String>,
    pub image_uri_art_crop: Option<String>,
    pub image_uri_border_crop: Option<String>,
    pub image_data_small: Option<Vec<u8>>,
    pub image_data_normal: Option<Vec<u8>>,
    pub image_data_large: Option<Vec<u8>>,
}

/// A stored card with everything the row carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDefinition {
    pub id: i64,
    pub card: NewCard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
