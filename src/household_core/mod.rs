//! Household Core - Membership and Ownership Engine
//!
//! ```text
//! create / join (invite token = household id)
//!     ↓ capacity + single-membership invariants, serialized per household
//! HouseholdMembershipManager
//!     ↓ explicit Migrate | Discard choice for personal items
//! InventoryStore (rescope / purge, atomic per item set)
//! ```

pub mod invite;
pub mod membership;

pub use invite::validate_invite_token;
pub use membership::{HouseholdMembershipManager, MigrationChoice};
