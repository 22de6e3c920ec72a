//! Database module: entity models and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: the card row aggregate and the insert shape.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! External modules should import from `card_ingest::db`; the repository API
//! and the models are re-exported here.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::{CardDefinition, NewCard};
