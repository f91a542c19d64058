//! Scoring and leaderboard engine for prediction leagues.
//!
//! The engine turns match results into bet points, folds them into
//! per-league standings, daily trend snapshots and periodic league reports.
//! Every pass is an idempotent overwrite of derived data, so a pass that
//! failed or was cancelled is simply run again.

pub mod database;
pub mod dto;
pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod services;
pub mod settings;
pub mod traits;

pub use database::Database;
pub use error::{EngineError, PassStage, StorageError};
pub use settings::EngineSettings;
pub use traits::{AggregateStore, BetLedger, EngineStore, FixtureStore, LeagueLocks};
