pub mod bet;
pub mod fixture;
pub mod lock;
pub mod performance;
pub mod report;
pub mod trend;
