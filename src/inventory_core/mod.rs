//! Inventory Core - Item Lifecycle and Expiry Engine
//!
//! ```text
//! caller intent (add / edit / consume / throw away / restore)
//!     ↓
//! ItemLifecycleManager (validation, diffing, state machine)
//!     ↓ atomic item + activity write
//! InventoryStore
//!     ↓ read-only, on demand
//! ExpiryClassifier (days-difference → Active | ExpiringSoon | Expired)
//! ```

pub mod expiry;
pub mod lifecycle;

pub use expiry::{
    bucket_items, classify, expiry_label, BucketedItem, ExpiryBucket, ExpiryStatus,
    InventoryBuckets,
};
pub use lifecycle::{ItemChanges, ItemLifecycleManager, NewItem};
