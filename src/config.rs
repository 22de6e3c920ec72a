//! Configuration loader and validator for the card ingest job.
use crate::model::BulkKind;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub scryfall: Scryfall,
    pub ingest: Ingest,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// Scryfall API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scryfall {
    pub api_base: String,
    pub user_agent: String,
}

/// Knobs of the ingest pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingest {
    pub bulk_type: BulkKind,
    /// Items processed concurrently per window.
    pub window: usize,
    /// Commit once this many items have been processed since the last commit.
    pub commit_every: usize,
    pub image_timeout_secs: u64,
    #[serde(default = "default_download_images")]
    pub download_images: bool,
}

fn default_download_images() -> bool {
    true
}

/// Values the orchestrator needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    pub bulk_type: BulkKind,
    pub window: usize,
    pub commit_every: usize,
    pub image_timeout: Duration,
    pub download_images: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            bulk_type: BulkKind::AllCards,
            window: 32,
            commit_every: 500,
            image_timeout: Duration::from_secs(30),
            download_images: true,
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// Default database URL inside the data directory.
    pub fn database_url(&self) -> String {
        format!(
            "sqlite://{}/cards.db",
            self.app.data_dir.trim_end_matches('/')
        )
    }

    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            bulk_type: self.ingest.bulk_type,
            window: self.ingest.window,
            commit_every: self.ingest.commit_every,
            image_timeout: Duration::from_secs(self.ingest.image_timeout_secs),
            download_images: self.ingest.download_images,
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }

    if Url::parse(cfg.scryfall.api_base.trim()).is_err() {
        return Err(ConfigError::Invalid("scryfall.api_base must be a valid URL"));
    }
    if cfg.scryfall.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("scryfall.user_agent must be non-empty"));
    }

    if cfg.ingest.window == 0 {
        return Err(ConfigError::Invalid("ingest.window must be > 0"));
    }
    if cfg.ingest.commit_every == 0 {
        return Err(ConfigError::Invalid("ingest.commit_every must be > 0"));
    }
    if cfg.ingest.image_timeout_secs == 0 {
        return Err(ConfigError::Invalid("ingest.image_timeout_secs must be > 0"));
    }

    Ok(())
}

/// Returns the example YAML shipped with the project.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

scryfall:
  api_base: "https://api.scryfall.com/"
  user_agent: "card-ingest/0.1"

ingest:
  bulk_type: all_cards
  window: 32
  commit_every: 500
  image_timeout_secs: 30
  download_images: true
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.ingest.bulk_type, BulkKind::AllCards);
    }

    #[test]
    fn settings_follow_ingest_section() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        let settings = cfg.ingest_settings();
        assert_eq!(settings.window, 32);
        assert_eq!(settings.commit_every, 500);
        assert_eq!(settings.image_timeout, Duration::from_secs(30));
        assert!(settings.download_images);
    }

    #[test]
    fn download_images_defaults_to_true() {
        let yaml = example().replace("  download_images: true\n", "");
        let cfg: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(cfg.ingest.download_images);
    }

    #[test]
    fn unknown_bulk_type_is_a_parse_error() {
        let yaml = example().replace("all_cards", "every_card");
        assert!(serde_yaml::from_str::<Config>(&yaml).is_err());
    }

    #[test]
    fn invalid_api_base() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.scryfall.api_base = "not a url".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("api_base")), _ => panic!("wrong error") }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.scryfall.user_agent = " ".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_ingest_knobs() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.ingest.window = 0;
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("window")), _ => panic!("wrong error") }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.ingest.commit_every = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.ingest.image_timeout_secs = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
        assert!(cfg.database_url().ends_with("/data/cards.db"));
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.scryfall.user_agent, "card-ingest/0.1");
    }
}
