use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scryfall bulk dataset kinds the pipeline knows how to ingest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum BulkKind {
    OracleCards,
    UniqueArtwork,
    DefaultCards,
    AllCards,
}

impl BulkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkKind::OracleCards => "oracle_cards",
            BulkKind::UniqueArtwork => "unique_artwork",
            BulkKind::DefaultCards => "default_cards",
            BulkKind::AllCards => "all_cards",
        }
    }
}

impl fmt::Display for BulkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oracle_cards" => Ok(BulkKind::OracleCards),
            "unique_artwork" => Ok(BulkKind::UniqueArtwork),
            "default_cards" => Ok(BulkKind::DefaultCards),
            "all_cards" => Ok(BulkKind::AllCards),
            other => Err(format!("unknown bulk data kind: {other}")),
        }
    }
}

/// Image resolutions that are downloaded and stored as binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSize {
    Small,
    Normal,
    Large,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Small => "small",
            ImageSize::Normal => "normal",
            ImageSize::Large => "large",
        }
    }
}

/// Lifecycle of one ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Locating,
    Downloading,
    Processing,
    Committing,
    Done,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Locating => "LOCATING",
            RunPhase::Downloading => "DOWNLOADING",
            RunPhase::Processing => "PROCESSING",
            RunPhase::Committing => "COMMITTING",
            RunPhase::Done => "DONE",
            RunPhase::Failed => "FAILED",
        }
    }
}

/// What happened to a single bulk entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Staged,
    AlreadyStored,
    Rejected,
}

/// Process-local bookkeeping for one run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun {
    pub total: usize,
    pub window: usize,
    pub commit_every: usize,
    pub uncommitted: usize,
    pub processed: usize,
    pub staged: usize,
    pub already_stored: usize,
    pub rejected: usize,
    pub commits: usize,
    pub committed_items: usize,
}

impl BatchRun {
    pub fn new(total: usize, window: usize, commit_every: usize) -> Self {
        Self {
            total,
            window,
            commit_every,
            uncommitted: 0,
            processed: 0,
            staged: 0,
            already_stored: 0,
            rejected: 0,
            commits: 0,
            committed_items: 0,
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Staged => self.staged += 1,
            ItemOutcome::AlreadyStored => self.already_stored += 1,
            ItemOutcome::Rejected => self.rejected += 1,
        }
    }

    /// Account for a finished window. Returns true once the commit threshold is reached.
    pub fn finish_window(&mut self, items: usize) -> bool {
        self.uncommitted += items;
        self.processed += items;
        self.uncommitted >= self.commit_every
    }

    pub fn has_uncommitted(&self) -> bool {
        self.uncommitted > 0
    }

    pub fn mark_committed(&mut self) {
        self.commits += 1;
        self.committed_items += self.uncommitted;
        self.uncommitted = 0;
    }
}

/// Final report of a run, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub phase: RunPhase,
    pub total: usize,
    pub processed: usize,
    pub staged: usize,
    pub already_stored: usize,
    pub rejected: usize,
    pub commits: usize,
}

impl From<&BatchRun> for RunSummary {
    fn from(run: &BatchRun) -> Self {
        Self {
            phase: RunPhase::Done,
            total: run.total,
            processed: run.processed,
            staged: run.staged,
            already_stored: run.already_stored,
            rejected: run.rejected,
            commits: run.commits,
        }
    }
}
