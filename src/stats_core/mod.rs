//! Stats Core - Waste Analytics Engine
//!
//! ```text
//! activity log (append-only, per scope)
//!     ↓ full re-read per call
//! WasteStatisticsAggregator
//!     ↓
//! WasteStatistics (totals, streaks, rankings, period-over-period reduction)
//! ```
//!
//! The activity log is the source of truth; item snapshots are never
//! consulted, so statistics survive item edits and scope transfers.

pub mod aggregator;
pub mod report;

pub use aggregator::WasteStatisticsAggregator;
pub use report::{MostWastedItem, ReportingWindow, WasteStatistics};
