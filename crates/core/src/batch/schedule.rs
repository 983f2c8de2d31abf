//! Monthly due-date predicates for the batch jobs.

use chrono::{Datelike, NaiveDate};
use tucano_shared::config::BatchConfig;

/// Days of month on which each job runs.
///
/// Configured days past the end of a short month clamp to its last day, so
/// a day-31 schedule still fires in February.
#[derive(Debug, Clone, Copy)]
pub struct MonthlySchedule {
    /// Day of month for the maintenance fee job.
    pub fee_day: u32,
    /// Day of month for the savings yield job.
    pub yield_day: u32,
}

impl MonthlySchedule {
    /// Builds the schedule from configuration.
    #[must_use]
    pub const fn from_config(config: &BatchConfig) -> Self {
        Self {
            fee_day: config.fee_day,
            yield_day: config.yield_day,
        }
    }

    /// True when the fee job is due on `date`.
    #[must_use]
    pub fn fee_due(&self, date: NaiveDate) -> bool {
        date.day() == effective_day(self.fee_day, date)
    }

    /// True when the yield job is due on `date`.
    #[must_use]
    pub fn yield_due(&self, date: NaiveDate) -> bool {
        date.day() == effective_day(self.yield_day, date)
    }
}

impl Default for MonthlySchedule {
    fn default() -> Self {
        Self::from_config(&BatchConfig::default())
    }
}

fn effective_day(configured: u32, date: NaiveDate) -> u32 {
    configured.clamp(1, days_in_month(date.year(), date.month()))
}

/// Number of days in a month.
fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(next), Some(first)) => u32::try_from(next.signed_duration_since(first).num_days())
            .unwrap_or(31),
        _ => 31,
    }
}
