//! Statistics report types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{date_of_millis, Household};

/// Reporting window for waste statistics: all calendar days from `since` up
/// to and including the `today` passed to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingWindow {
    pub since: NaiveDate,
}

impl ReportingWindow {
    pub fn since(since: NaiveDate) -> Self {
        Self { since }
    }

    /// Default window for a household scope: since household creation.
    pub fn since_creation_of(household: &Household, today: NaiveDate) -> Self {
        let since = date_of_millis(household.created_at).unwrap_or(today);
        Self { since }
    }

    /// Whole days covered, never less than 1 (a window opened today still
    /// divides by one day).
    pub fn days(&self, today: NaiveDate) -> i64 {
        (today - self.since).num_days().max(1)
    }
}

/// One entry of the most-wasted ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostWastedItem {
    pub name: String,
    pub count: u64,
}

/// Aggregate waste metrics for one scope, recomputed from the activity log
/// on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteStatistics {
    /// Thrown-away records inside the window.
    pub total_waste: u64,
    pub average_waste_per_day: f64,
    /// Consecutive calendar days ending today with no waste.
    pub days_without_waste: u32,
    pub most_wasted_items: Vec<MostWastedItem>,
    /// `round(100 * consumed / (consumed + thrown))`, 0 when nothing ended.
    pub used_items_percentage: u32,
    /// Percentage drop vs the equal-length previous period; negative when
    /// waste increased, 0 when the previous period had none.
    pub waste_reduction: i64,
}
