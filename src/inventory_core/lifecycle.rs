//! Item lifecycle state machine
//!
//! Active → Consumed or Active → ThrownAway, both revertible. Every
//! meaningful mutation appends exactly one activity record per changed
//! field, written atomically with the item itself. Deletion is not a
//! capability of this manager; only the household/account deletion flow
//! removes items.

use std::sync::Arc;

use chrono::NaiveDate;

use super::expiry::{bucket_items, InventoryBuckets};
use crate::config::EngineConfig;
use crate::error::{LifecycleError, ValidationError};
use crate::events::{EngineEvent, EventSink};
use crate::model::{
    generate_id, now_millis, ActivityRecord, ActivityType, Category, FoodItem, OwnerScope,
    StorageLocation, Unit,
};
use crate::storage::{InventoryStore, ItemQuery};

/// Fields for a new item. Id and created-at are assigned by the manager.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub scope: OwnerScope,
    pub name: String,
    pub quantity: u32,
    pub unit: Unit,
    pub storage_location: StorageLocation,
    pub category: Category,
    pub expiry_timestamp: Option<i64>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub unit: Option<Unit>,
    pub storage_location: Option<StorageLocation>,
    pub category: Option<Category>,
    pub expiry_timestamp: Option<i64>,
}

pub struct ItemLifecycleManager<S> {
    store: Arc<S>,
    config: EngineConfig,
    events: EventSink,
}

impl<S: InventoryStore> ItemLifecycleManager<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            events: EventSink::disabled(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Validate, persist and log a new item.
    pub async fn add_item(
        &self,
        new_item: NewItem,
        actor_id: &str,
    ) -> Result<FoodItem, LifecycleError> {
        let name = new_item.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::new("name", "must not be empty").into());
        }
        let expiry_timestamp = new_item
            .expiry_timestamp
            .ok_or_else(|| ValidationError::new("expiry_timestamp", "must be present"))?;

        let now = now_millis();
        let item = FoodItem {
            id: generate_id(),
            scope: new_item.scope,
            name,
            quantity: new_item.quantity,
            unit: new_item.unit,
            storage_location: new_item.storage_location,
            category: new_item.category,
            expiry_timestamp,
            consumed: false,
            thrown_away: false,
            created_at: now,
        };
        let record = self.record(&item, ActivityType::ProductAdded, actor_id, now);
        self.store
            .put_item_with_activities(&item, std::slice::from_ref(&record))
            .await?;

        log::info!("🧺 Added item '{}' to {}", item.name, item.scope);
        self.events.emit(EngineEvent::ItemAdded(item.clone()));
        Ok(item)
    }

    /// Diff the supplied fields against the stored item, apply them as one
    /// logical update, and log one record per changed field. Unchanged
    /// fields produce no records.
    pub async fn update_item(
        &self,
        id: &str,
        changes: ItemChanges,
        actor_id: &str,
    ) -> Result<FoodItem, LifecycleError> {
        let mut item = self.load(id).await?;
        let now = now_millis();
        let mut records = Vec::new();

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ValidationError::new("name", "must not be empty").into());
            }
            if name != item.name {
                item.name = name;
                records.push(self.record(&item, ActivityType::Name, actor_id, now));
            }
        }
        if let Some(quantity) = changes.quantity {
            if quantity != item.quantity {
                let activity_type = if quantity > item.quantity {
                    ActivityType::QuantityIncreased
                } else {
                    ActivityType::QuantityDecreased
                };
                item.quantity = quantity;
                records.push(self.record(&item, activity_type, actor_id, now));
            }
        }
        if let Some(expiry_timestamp) = changes.expiry_timestamp {
            if expiry_timestamp != item.expiry_timestamp {
                item.expiry_timestamp = expiry_timestamp;
                records.push(self.record(&item, ActivityType::Expiry, actor_id, now));
            }
        }
        if let Some(storage_location) = changes.storage_location {
            if storage_location != item.storage_location {
                item.storage_location = storage_location;
                records.push(self.record(&item, ActivityType::Storage, actor_id, now));
            }
        }
        if let Some(category) = changes.category {
            if category != item.category {
                item.category = category;
                records.push(self.record(&item, ActivityType::Category, actor_id, now));
            }
        }
        if let Some(unit) = changes.unit {
            // Unit is not part of the per-field activity taxonomy; residual
            // changes go through the generic edit type.
            if unit != item.unit {
                item.unit = unit;
                records.push(self.record(&item, ActivityType::Edit, actor_id, now));
            }
        }

        if records.is_empty() {
            return Ok(item);
        }

        self.store.put_item_with_activities(&item, &records).await?;
        log::info!(
            "📝 Updated item '{}' ({} field(s) changed)",
            item.name,
            records.len()
        );
        self.events.emit(EngineEvent::ItemUpdated(item.clone()));
        Ok(item)
    }

    /// Move the item to the Consumed terminal state. Clears `thrown_away`
    /// if set. Idempotent: no record when already consumed.
    pub async fn mark_consumed(
        &self,
        id: &str,
        actor_id: &str,
    ) -> Result<FoodItem, LifecycleError> {
        let mut item = self.load(id).await?;
        if item.consumed {
            return Ok(item);
        }
        item.consumed = true;
        item.thrown_away = false;
        let record = self.record(&item, ActivityType::Consumed, actor_id, now_millis());
        self.store
            .put_item_with_activities(&item, std::slice::from_ref(&record))
            .await?;
        log::info!("🍽️ Marked item '{}' consumed", item.name);
        self.events.emit(EngineEvent::ItemConsumed(item.clone()));
        Ok(item)
    }

    /// Move the item to the ThrownAway terminal state. Clears `consumed` if
    /// set. Idempotent: no record when already thrown away.
    pub async fn mark_thrown_away(
        &self,
        id: &str,
        actor_id: &str,
    ) -> Result<FoodItem, LifecycleError> {
        let mut item = self.load(id).await?;
        if item.thrown_away {
            return Ok(item);
        }
        item.thrown_away = true;
        item.consumed = false;
        let record = self.record(&item, ActivityType::ThrownAway, actor_id, now_millis());
        self.store
            .put_item_with_activities(&item, std::slice::from_ref(&record))
            .await?;
        log::info!("🗑️ Marked item '{}' thrown away", item.name);
        self.events.emit(EngineEvent::ItemThrownAway(item.clone()));
        Ok(item)
    }

    /// Revert a terminal state back to Active (the un-check path). Idempotent
    /// on already-active items.
    pub async fn restore(&self, id: &str, actor_id: &str) -> Result<FoodItem, LifecycleError> {
        let mut item = self.load(id).await?;
        if item.is_active() {
            return Ok(item);
        }
        item.consumed = false;
        item.thrown_away = false;
        let record = self.record(&item, ActivityType::Edit, actor_id, now_millis());
        self.store
            .put_item_with_activities(&item, std::slice::from_ref(&record))
            .await?;
        log::info!("↩️ Restored item '{}' to active", item.name);
        self.events.emit(EngineEvent::ItemRestored(item.clone()));
        Ok(item)
    }

    /// Pull API: classify the scope's active items against `today`.
    pub async fn current_buckets(
        &self,
        scope: OwnerScope,
        today: NaiveDate,
    ) -> Result<InventoryBuckets, LifecycleError> {
        let items = self.store.query_items(&ItemQuery::active(scope)).await?;
        Ok(bucket_items(
            items,
            today,
            self.config.expiring_soon_threshold_days,
        ))
    }

    /// Active items of a scope in one storage location (the inventory
    /// screen's per-location sections).
    pub async fn items_by_storage_location(
        &self,
        scope: OwnerScope,
        location: StorageLocation,
    ) -> Result<Vec<FoodItem>, LifecycleError> {
        Ok(self
            .store
            .query_items(&ItemQuery::active(scope).with_storage_location(location))
            .await?)
    }

    async fn load(&self, id: &str) -> Result<FoodItem, LifecycleError> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))
    }

    fn record(
        &self,
        item: &FoodItem,
        activity_type: ActivityType,
        actor_id: &str,
        timestamp: i64,
    ) -> ActivityRecord {
        ActivityRecord {
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            scope: item.scope.clone(),
            activity_type,
            timestamp,
            actor_id: actor_id.to_string(),
        }
    }
}
