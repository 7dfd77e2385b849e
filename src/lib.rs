//! PantryFlow - Household Food Inventory Engine
//!
//! Domain core of a household food-inventory tracker: item lifecycle,
//! days-to-expiry bucketing, household membership and waste analytics.
//! Storage, identity, notification delivery and UI are collaborators behind
//! the `InventoryStore` trait and the optional event channel.
//!
//! # Architecture
//!
//! ```text
//! caller events → ItemLifecycleManager ──┐ (item + activity writes)
//!                 HouseholdMembershipManager ──┤
//!                     ↓                        ↓
//!               InventoryStore (memory | sqlite | yours)
//!                     ↓ read-only               ↓ read-only
//!               ExpiryClassifier          WasteStatisticsAggregator
//!                     ↓                        ↓
//!               InventoryBuckets          WasteStatistics
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod storage;

pub mod household_core;
pub mod inventory_core;
pub mod stats_core;

pub use config::EngineConfig;
pub use error::{HouseholdError, LifecycleError, ValidationError};
pub use events::{EngineEvent, EventSink};
pub use household_core::{HouseholdMembershipManager, MigrationChoice};
pub use inventory_core::{
    ExpiryBucket, ExpiryStatus, InventoryBuckets, ItemChanges, ItemLifecycleManager, NewItem,
};
pub use model::{
    ActivityRecord, ActivityType, Category, FoodItem, Household, HouseholdType, Member,
    OwnerScope, StorageLocation, Unit,
};
pub use stats_core::{ReportingWindow, WasteStatistics, WasteStatisticsAggregator};
pub use storage::{
    ActivityQuery, InventoryStore, ItemQuery, MemoryStore, SqliteStore, StoreError,
};
