use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One entry of the `/bulk-data` directory.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BulkDataEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub download_uri: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Deserialize, Debug)]
pub struct BulkDataList {
    pub data: Vec<BulkDataEntry>,
}
