use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 500;

/// Tunables shared by every engine pass.
#[derive(Debug, Clone, Validate)]
pub struct EngineSettings {
    /// Rows fetched per store round-trip.
    #[validate(range(min = 1, max = 10_000, message = "page_size must be between 1 and 10000"))]
    pub page_size: i64,

    /// Fixed UTC offset used to bucket match kick-offs into calendar days.
    #[validate(range(
        min = -720,
        max = 840,
        message = "trend offset must be between -720 and 840 minutes"
    ))]
    pub trend_utc_offset_minutes: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            trend_utc_offset_minutes: 0,
        }
    }
}

impl EngineSettings {
    pub fn trend_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.trend_utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Current calendar day in the trend time zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.trend_offset()).date_naive()
    }
}
