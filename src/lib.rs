pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod scryfall;
pub mod store;
pub mod transform;
