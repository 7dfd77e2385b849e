//! Days-to-expiry classification
//!
//! Pure calendar math over item snapshots; no storage access. A daily
//! rebucket at local midnight is just a re-invocation with a new `today`.

use chrono::NaiveDate;

use crate::model::FoodItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpiryBucket {
    /// More than `threshold` days left.
    Active,
    /// Between 0 and `threshold` days left, inclusive.
    ExpiringSoon,
    /// Expiry date lies in the past.
    Expired,
}

impl ExpiryBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryBucket::Active => "active",
            ExpiryBucket::ExpiringSoon => "expiring_soon",
            ExpiryBucket::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryStatus {
    /// Expiry date minus today, in whole calendar days. Negative = past.
    pub days_difference: i64,
    pub bucket: ExpiryBucket,
}

/// Classify one item against `today`. Returns `None` for terminal items
/// (consumed or thrown away) and for timestamps outside the calendar range.
pub fn classify(item: &FoodItem, today: NaiveDate, threshold_days: i64) -> Option<ExpiryStatus> {
    if !item.is_active() {
        return None;
    }
    let expiry = item.expiry_date()?;
    let days_difference = (expiry - today).num_days();
    let bucket = if days_difference < 0 {
        ExpiryBucket::Expired
    } else if days_difference <= threshold_days {
        ExpiryBucket::ExpiringSoon
    } else {
        ExpiryBucket::Active
    };
    Some(ExpiryStatus {
        days_difference,
        bucket,
    })
}

/// Human-readable label for a days-difference value. Boundary values are
/// exact: -1 "yesterday", 0 "today", 1 "tomorrow".
pub fn expiry_label(days_difference: i64) -> String {
    match days_difference {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        d if d > 1 => format!("in {} days", d),
        d => format!("{} days ago", -d),
    }
}

/// One classified item inside a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedItem {
    pub item: FoodItem,
    pub status: ExpiryStatus,
}

/// The current item set of a scope, split by bucket. Each bucket is sorted
/// ascending by days-difference, ties broken by case-insensitive name.
#[derive(Debug, Clone, Default)]
pub struct InventoryBuckets {
    pub active: Vec<BucketedItem>,
    pub expiring_soon: Vec<BucketedItem>,
    pub expired: Vec<BucketedItem>,
}

impl InventoryBuckets {
    pub fn total(&self) -> usize {
        self.active.len() + self.expiring_soon.len() + self.expired.len()
    }
}

/// Bucket a set of items. Terminal items are excluded entirely.
pub fn bucket_items(
    items: impl IntoIterator<Item = FoodItem>,
    today: NaiveDate,
    threshold_days: i64,
) -> InventoryBuckets {
    let mut buckets = InventoryBuckets::default();
    for item in items {
        let Some(status) = classify(&item, today, threshold_days) else {
            continue;
        };
        let entry = BucketedItem { item, status };
        match status.bucket {
            ExpiryBucket::Active => buckets.active.push(entry),
            ExpiryBucket::ExpiringSoon => buckets.expiring_soon.push(entry),
            ExpiryBucket::Expired => buckets.expired.push(entry),
        }
    }
    for bucket in [
        &mut buckets.active,
        &mut buckets.expiring_soon,
        &mut buckets.expired,
    ] {
        bucket.sort_by(|a, b| {
            a.status
                .days_difference
                .cmp(&b.status.days_difference)
                .then_with(|| {
                    a.item
                        .name
                        .to_lowercase()
                        .cmp(&b.item.name.to_lowercase())
                })
        });
    }
    buckets
}
