//! Job runners and interval scheduler driving the league engine.

pub mod config;
pub mod error;
pub mod jobs;
pub mod runner;

pub use error::{Result, SchedulerError};
pub use jobs::{JobFailure, JobLimits, JobSummary, Jobs, LeagueJob};
pub use runner::Intervals;
