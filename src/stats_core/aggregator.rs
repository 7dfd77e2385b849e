//! Waste statistics aggregation
//!
//! Read-only fold over the scope's activity log. Nothing is cached or
//! persisted between calls, so the numbers always reflect the log as stored;
//! concurrent writers are tolerated (a call may see a slightly stale log).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use super::report::{MostWastedItem, ReportingWindow, WasteStatistics};
use crate::config::EngineConfig;
use crate::model::{date_of_millis, ActivityRecord, ActivityType, OwnerScope};
use crate::storage::{ActivityQuery, InventoryStore, StoreError};

pub struct WasteStatisticsAggregator<S> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: InventoryStore> WasteStatisticsAggregator<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Compute every metric for the scope over the window ending `today`.
    pub async fn statistics(
        &self,
        scope: OwnerScope,
        window: ReportingWindow,
        today: NaiveDate,
    ) -> Result<WasteStatistics, StoreError> {
        let records = self
            .store
            .query_activities(&ActivityQuery::scoped(scope))
            .await?;

        let in_window = |date: NaiveDate| date >= window.since && date <= today;

        let mut total_waste = 0u64;
        let mut consumed_count = 0u64;
        let mut waste_days: HashSet<NaiveDate> = HashSet::new();
        let mut waste_by_name: HashMap<&str, u64> = HashMap::new();
        let mut waste_dates: Vec<NaiveDate> = Vec::new();

        for record in &records {
            let Some(date) = record_date(record) else {
                continue;
            };
            match record.activity_type {
                ActivityType::ThrownAway => {
                    waste_days.insert(date);
                    waste_dates.push(date);
                    if in_window(date) {
                        total_waste += 1;
                        *waste_by_name.entry(record.item_name.as_str()).or_insert(0) += 1;
                    }
                }
                ActivityType::Consumed => {
                    if in_window(date) {
                        consumed_count += 1;
                    }
                }
                _ => {}
            }
        }

        let average_waste_per_day = total_waste as f64 / window.days(today) as f64;
        let days_without_waste = days_without_waste(&waste_days, window.since, today);
        let most_wasted_items = top_wasted(waste_by_name, self.config.most_wasted_top_n);
        let used_items_percentage = percentage(consumed_count, consumed_count + total_waste);
        let waste_reduction = waste_reduction(&waste_dates, window.days(today), today);

        Ok(WasteStatistics {
            total_waste,
            average_waste_per_day,
            days_without_waste,
            most_wasted_items,
            used_items_percentage,
            waste_reduction,
        })
    }
}

fn record_date(record: &ActivityRecord) -> Option<NaiveDate> {
    date_of_millis(record.timestamp)
}

/// Consecutive calendar days ending today with no thrown-away record,
/// scanning backward until the first waste day or the window start.
fn days_without_waste(waste_days: &HashSet<NaiveDate>, since: NaiveDate, today: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut day = today;
    loop {
        if waste_days.contains(&day) {
            break;
        }
        streak += 1;
        if day <= since {
            break;
        }
        day = match day.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }
    streak
}

/// Top-N names by waste count, descending; ties alphabetical.
fn top_wasted(waste_by_name: HashMap<&str, u64>, top_n: usize) -> Vec<MostWastedItem> {
    let mut ranked: Vec<MostWastedItem> = waste_by_name
        .into_iter()
        .map(|(name, count)| MostWastedItem {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(top_n);
    ranked
}

/// Integer percentage, rounded half-up, with a guarded denominator.
fn percentage(part: u64, total: u64) -> u32 {
    (100.0 * part as f64 / total.max(1) as f64).round() as u32
}

/// Compare two equal-length consecutive periods ending today. `period_days`
/// calendar days each, current period includes today.
fn waste_reduction(waste_dates: &[NaiveDate], period_days: i64, today: NaiveDate) -> i64 {
    let current_start = today - chrono::Duration::days(period_days - 1);
    let previous_start = current_start - chrono::Duration::days(period_days);

    let mut current = 0i64;
    let mut previous = 0i64;
    for &date in waste_dates {
        if date >= current_start && date <= today {
            current += 1;
        } else if date >= previous_start && date < current_start {
            previous += 1;
        }
    }

    if previous == 0 {
        return 0;
    }
    (100.0 * (previous - current) as f64 / previous.max(1) as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn millis_on(date: NaiveDate) -> i64 {
        date.and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    fn create_test_record(
        scope: &OwnerScope,
        name: &str,
        activity_type: ActivityType,
        date: NaiveDate,
    ) -> ActivityRecord {
        ActivityRecord {
            item_id: format!("id_{}", name),
            item_name: name.to_string(),
            scope: scope.clone(),
            activity_type,
            timestamp: millis_on(date),
            actor_id: "user1".to_string(),
        }
    }

    async fn aggregator_with(
        records: Vec<ActivityRecord>,
    ) -> WasteStatisticsAggregator<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for record in &records {
            store.append_activity(record).await.unwrap();
        }
        WasteStatisticsAggregator::new(store, EngineConfig::default())
    }

    fn scope() -> OwnerScope {
        OwnerScope::User("user1".to_string())
    }

    #[tokio::test]
    async fn test_days_without_waste_fixture() {
        // thrown_away counts [2, 0, 1, 0, 0] over the last 5 days, today last
        let scope = scope();
        let d = |offset: u64| today() - chrono::Days::new(offset);
        let mut records = Vec::new();
        records.push(create_test_record(&scope, "bread", ActivityType::ThrownAway, d(4)));
        records.push(create_test_record(&scope, "milk", ActivityType::ThrownAway, d(4)));
        records.push(create_test_record(&scope, "eggs", ActivityType::ThrownAway, d(2)));

        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(d(4)), today())
            .await
            .unwrap();
        assert_eq!(stats.days_without_waste, 2);
        assert_eq!(stats.total_waste, 3);
    }

    #[tokio::test]
    async fn test_waste_today_means_zero_days_without() {
        let scope = scope();
        let records = vec![create_test_record(
            &scope,
            "milk",
            ActivityType::ThrownAway,
            today(),
        )];
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(today()), today())
            .await
            .unwrap();
        assert_eq!(stats.days_without_waste, 0);
    }

    #[tokio::test]
    async fn test_used_items_percentage_rounds() {
        // 3 consumed, 1 thrown away -> 75
        let scope = scope();
        let mut records = vec![create_test_record(
            &scope,
            "bread",
            ActivityType::ThrownAway,
            today(),
        )];
        for name in ["a", "b", "c"] {
            records.push(create_test_record(&scope, name, ActivityType::Consumed, today()));
        }
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(today()), today())
            .await
            .unwrap();
        assert_eq!(stats.used_items_percentage, 75);
    }

    #[tokio::test]
    async fn test_used_items_percentage_with_no_terminal_items() {
        let scope = scope();
        let records = vec![create_test_record(
            &scope,
            "milk",
            ActivityType::ProductAdded,
            today(),
        )];
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(today()), today())
            .await
            .unwrap();
        assert_eq!(stats.used_items_percentage, 0);
    }

    #[tokio::test]
    async fn test_most_wasted_ranking_with_alphabetical_ties() {
        let scope = scope();
        let mut records = Vec::new();
        for _ in 0..3 {
            records.push(create_test_record(&scope, "milk", ActivityType::ThrownAway, today()));
        }
        for name in ["bread", "apples"] {
            records.push(create_test_record(&scope, name, ActivityType::ThrownAway, today()));
        }
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(today()), today())
            .await
            .unwrap();
        let names: Vec<&str> = stats
            .most_wasted_items
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["milk", "apples", "bread"]);
        assert_eq!(stats.most_wasted_items[0].count, 3);
    }

    #[tokio::test]
    async fn test_most_wasted_truncates_to_top_n() {
        let scope = scope();
        let mut records = Vec::new();
        for name in ["a", "b", "c", "d", "e", "f", "g"] {
            records.push(create_test_record(&scope, name, ActivityType::ThrownAway, today()));
        }
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(today()), today())
            .await
            .unwrap();
        assert_eq!(stats.most_wasted_items.len(), 5);
    }

    #[tokio::test]
    async fn test_average_waste_per_day() {
        let scope = scope();
        let since = today() - chrono::Days::new(4);
        let mut records = Vec::new();
        for _ in 0..2 {
            records.push(create_test_record(&scope, "milk", ActivityType::ThrownAway, since));
        }
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(since), today())
            .await
            .unwrap();
        assert!((stats.average_waste_per_day - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_waste_reduction_halved() {
        // previous period: 4 thrown, current period: 2 -> 50% reduction
        let scope = scope();
        let since = today() - chrono::Days::new(6); // 6-day periods
        let previous_day = today() - chrono::Days::new(8);
        let mut records = Vec::new();
        for _ in 0..4 {
            records.push(create_test_record(
                &scope,
                "milk",
                ActivityType::ThrownAway,
                previous_day,
            ));
        }
        for _ in 0..2 {
            records.push(create_test_record(&scope, "milk", ActivityType::ThrownAway, today()));
        }
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(since), today())
            .await
            .unwrap();
        assert_eq!(stats.waste_reduction, 50);
    }

    #[tokio::test]
    async fn test_waste_reduction_zero_without_previous_waste() {
        let scope = scope();
        let records = vec![create_test_record(
            &scope,
            "milk",
            ActivityType::ThrownAway,
            today(),
        )];
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(today()), today())
            .await
            .unwrap();
        assert_eq!(stats.waste_reduction, 0);
    }

    #[tokio::test]
    async fn test_waste_reduction_negative_when_waste_grew() {
        let scope = scope();
        let since = today() - chrono::Days::new(6);
        let previous_day = today() - chrono::Days::new(8);
        let mut records = vec![create_test_record(
            &scope,
            "milk",
            ActivityType::ThrownAway,
            previous_day,
        )];
        for _ in 0..2 {
            records.push(create_test_record(&scope, "milk", ActivityType::ThrownAway, today()));
        }
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(since), today())
            .await
            .unwrap();
        assert_eq!(stats.waste_reduction, -100);
    }

    #[tokio::test]
    async fn test_recomputed_on_every_call() {
        let scope = scope();
        let store = Arc::new(MemoryStore::new());
        let aggregator = WasteStatisticsAggregator::new(store.clone(), EngineConfig::default());
        let window = ReportingWindow::since(today());

        let before = aggregator
            .statistics(scope.clone(), window, today())
            .await
            .unwrap();
        assert_eq!(before.total_waste, 0);

        store
            .append_activity(&create_test_record(
                &scope,
                "milk",
                ActivityType::ThrownAway,
                today(),
            ))
            .await
            .unwrap();

        let after = aggregator.statistics(scope, window, today()).await.unwrap();
        assert_eq!(after.total_waste, 1);
    }

    #[tokio::test]
    async fn test_other_scopes_do_not_leak() {
        let scope = scope();
        let other = OwnerScope::Household("h".repeat(20));
        let records = vec![create_test_record(
            &other,
            "milk",
            ActivityType::ThrownAway,
            today(),
        )];
        let aggregator = aggregator_with(records).await;
        let stats = aggregator
            .statistics(scope, ReportingWindow::since(today()), today())
            .await
            .unwrap();
        assert_eq!(stats.total_waste, 0);
    }
}
