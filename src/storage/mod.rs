//! Storage seam for the inventory engine
//!
//! The engine never talks to a database directly; everything goes through the
//! `InventoryStore` trait. Queries are conjunctive filter predicates (scope,
//! field = value, boolean flags) so any backend — document store, relational,
//! in-memory — can implement them.
//!
//! Two backends ship with the crate:
//! - `MemoryStore` — reference semantics, used by the test suite
//! - `SqliteStore` — rusqlite-backed persistent store
//!
//! Contract notes (what managers rely on):
//! - `put_item_with_activities` applies the item write and its activity
//!   records together or not at all.
//! - `update_household_atomic` serializes read-modify-write per household,
//!   so capacity checks inside the closure are race-free.
//! - `admit_member` checks single-membership and capacity under the same
//!   lock/transaction that persists the admission.
//! - `rescope` / `purge_scope` are atomic at the item-set level.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::model::{
    ActivityRecord, ActivityType, Category, FoodItem, Household, Member, OwnerScope,
    StorageLocation,
};
use crate::error::HouseholdError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug)]
pub enum StoreError {
    /// The backend could not complete the call. Not retried by the engine.
    Unavailable(String),
    Serialization(serde_json::Error),
    Io(std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "backend unavailable: {}", msg),
            StoreError::Serialization(e) => write!(f, "serialization error: {}", e),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Conjunctive equality filters over the item collection.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub scope: Option<OwnerScope>,
    pub storage_location: Option<StorageLocation>,
    pub category: Option<Category>,
    pub consumed: Option<bool>,
    pub thrown_away: Option<bool>,
}

impl ItemQuery {
    pub fn scoped(scope: OwnerScope) -> Self {
        Self {
            scope: Some(scope),
            ..Self::default()
        }
    }

    /// Active items of a scope: consumed = false, thrown_away = false.
    pub fn active(scope: OwnerScope) -> Self {
        Self {
            scope: Some(scope),
            consumed: Some(false),
            thrown_away: Some(false),
            ..Self::default()
        }
    }

    pub fn with_storage_location(mut self, location: StorageLocation) -> Self {
        self.storage_location = Some(location);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn matches(&self, item: &FoodItem) -> bool {
        if let Some(ref scope) = self.scope {
            if &item.scope != scope {
                return false;
            }
        }
        if let Some(location) = self.storage_location {
            if item.storage_location != location {
                return false;
            }
        }
        if let Some(category) = self.category {
            if item.category != category {
                return false;
            }
        }
        if let Some(consumed) = self.consumed {
            if item.consumed != consumed {
                return false;
            }
        }
        if let Some(thrown_away) = self.thrown_away {
            if item.thrown_away != thrown_away {
                return false;
            }
        }
        true
    }
}

/// Conjunctive filters over the activity log.
#[derive(Debug, Clone, Default)]
pub struct ActivityQuery {
    pub scope: Option<OwnerScope>,
    pub item_id: Option<String>,
    pub activity_type: Option<ActivityType>,
    /// Inclusive lower bound, epoch millis.
    pub since: Option<i64>,
    /// Exclusive upper bound, epoch millis.
    pub until: Option<i64>,
}

impl ActivityQuery {
    pub fn scoped(scope: OwnerScope) -> Self {
        Self {
            scope: Some(scope),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, activity_type: ActivityType) -> Self {
        self.activity_type = Some(activity_type);
        self
    }

    pub fn between(mut self, since: i64, until: i64) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    pub fn matches(&self, record: &ActivityRecord) -> bool {
        if let Some(ref scope) = self.scope {
            if &record.scope != scope {
                return false;
            }
        }
        if let Some(ref item_id) = self.item_id {
            if &record.item_id != item_id {
                return false;
            }
        }
        if let Some(activity_type) = self.activity_type {
            if record.activity_type != activity_type {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.timestamp >= until {
                return false;
            }
        }
        true
    }
}

/// Abstract collaborator holding items, the activity log, households and
/// member profiles.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    // Items
    async fn get_item(&self, id: &str) -> Result<Option<FoodItem>, StoreError>;
    async fn put_item(&self, item: &FoodItem) -> Result<(), StoreError>;
    async fn delete_item(&self, id: &str) -> Result<(), StoreError>;
    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<FoodItem>, StoreError>;

    /// Write the item and append the records in one atomic step.
    async fn put_item_with_activities(
        &self,
        item: &FoodItem,
        records: &[ActivityRecord],
    ) -> Result<(), StoreError>;

    // Activity log
    async fn append_activity(&self, record: &ActivityRecord) -> Result<(), StoreError>;
    async fn query_activities(
        &self,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, StoreError>;

    // Households
    async fn get_household(&self, id: &str) -> Result<Option<Household>, StoreError>;
    async fn put_household(&self, household: &Household) -> Result<(), StoreError>;
    async fn delete_household(&self, id: &str) -> Result<(), StoreError>;
    async fn household_for_user(&self, user_id: &str) -> Result<Option<Household>, StoreError>;

    /// Serialized read-modify-write on one household document. The closure
    /// sees the current document and either mutates it (the mutated document
    /// is persisted) or fails; two racing calls on the same household never
    /// interleave.
    async fn update_household_atomic(
        &self,
        id: &str,
        mutate: &(dyn for<'a> Fn(&'a mut Household) -> Result<(), HouseholdError> + Send + Sync),
    ) -> Result<Household, HouseholdError>;

    /// Admit a user into a household. The single-membership check (across
    /// every household) and the capacity check run under the same lock or
    /// transaction that persists the new member list, so neither can be
    /// defeated by a concurrent join. Admitting a current member is a no-op;
    /// the flag says whether the member list changed.
    async fn admit_member(
        &self,
        household_id: &str,
        user_id: &str,
    ) -> Result<(Household, bool), HouseholdError>;

    /// Re-own every item and activity record of `from` to `to`. Returns the
    /// number of items moved. Atomic at the item-set level.
    async fn rescope(&self, from: &OwnerScope, to: &OwnerScope) -> Result<u64, StoreError>;

    /// Delete every item and activity record of the scope. Returns the number
    /// of items deleted. Atomic at the item-set level.
    async fn purge_scope(&self, scope: &OwnerScope) -> Result<u64, StoreError>;

    // Member profiles (denormalized views)
    async fn put_member_profile(&self, member: &Member) -> Result<(), StoreError>;
    async fn member_profiles(&self, user_ids: &[String]) -> Result<Vec<Member>, StoreError>;
}
