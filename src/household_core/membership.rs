//! Household membership manager
//!
//! Owns household creation, joining, leaving and deletion, plus the
//! ownership transfer of personal items when a user moves into a household.
//! Capacity and single-membership invariants are re-validated on every
//! mutating call; both run inside the store's serialized admission, so two
//! racing joins on the last open slot, or one user racing into two
//! households, resolve to exactly one success.

use std::sync::Arc;

use crate::error::{HouseholdError, ValidationError};
use crate::events::{EngineEvent, EventSink};
use crate::model::{
    generate_id, now_millis, Household, HouseholdType, Member, OwnerScope,
};
use crate::storage::{InventoryStore, ItemQuery};

use super::invite::validate_invite_token;

/// What happens to a user's personal items when they enter a household.
/// Offered as an explicit choice whenever the user has at least one personal
/// item; never applied silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationChoice {
    /// Re-own the personal items and their activity to the household scope.
    Migrate,
    /// Delete the personal items and their activity.
    Discard,
}

pub struct HouseholdMembershipManager<S> {
    store: Arc<S>,
    events: EventSink,
}

impl<S: InventoryStore> HouseholdMembershipManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            events: EventSink::disabled(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub async fn create_household(
        &self,
        name: &str,
        household_type: HouseholdType,
        owner_id: &str,
    ) -> Result<Household, HouseholdError> {
        let name = name.trim();
        validate_household_name(name)?;
        if self.store.household_for_user(owner_id).await?.is_some() {
            return Err(HouseholdError::AlreadyMember);
        }

        let household = Household {
            id: generate_id(),
            name: name.to_string(),
            household_type,
            members: vec![owner_id.to_string()],
            owner_id: owner_id.to_string(),
            created_at: now_millis(),
        };
        self.store.put_household(&household).await?;

        log::info!(
            "🏠 Created {} household '{}' for {}",
            household.household_type.as_str(),
            household.name,
            owner_id
        );
        self.events
            .emit(EngineEvent::HouseholdCreated(household.clone()));
        Ok(household)
    }

    /// Join via invite token (= household id). Single-membership and
    /// capacity are both checked inside the store's serialized admission, so
    /// neither racing joins on the last slot nor racing joins into two
    /// different households can over-admit.
    pub async fn join_household(
        &self,
        invite_token: &str,
        user_id: &str,
    ) -> Result<Household, HouseholdError> {
        validate_invite_token(invite_token)?;

        let (household, admitted) = self.store.admit_member(invite_token, user_id).await?;
        if admitted {
            log::info!("🤝 {} joined household '{}'", user_id, household.name);
            self.events.emit(EngineEvent::MemberJoined {
                household_id: household.id.clone(),
                user_id: user_id.to_string(),
            });
        }
        Ok(household)
    }

    /// Number of items still owned by the user's personal scope.
    pub async fn personal_item_count(&self, user_id: &str) -> Result<usize, HouseholdError> {
        let items = self
            .store
            .query_items(&ItemQuery::scoped(OwnerScope::User(user_id.to_string())))
            .await?;
        Ok(items.len())
    }

    /// Whether the caller must put the migration choice in front of the user
    /// after creating or joining a household.
    pub async fn migration_required(&self, user_id: &str) -> Result<bool, HouseholdError> {
        Ok(self.personal_item_count(user_id).await? >= 1)
    }

    /// Apply the user's choice for their personal items after they entered
    /// the household. Atomic at the item-set level.
    pub async fn resolve_migration(
        &self,
        user_id: &str,
        household_id: &str,
        choice: MigrationChoice,
    ) -> Result<u64, HouseholdError> {
        let personal = OwnerScope::User(user_id.to_string());
        match choice {
            MigrationChoice::Migrate => {
                let household = self.require_household(household_id).await?;
                let moved = self.store.rescope(&personal, &household.scope()).await?;
                log::info!(
                    "📦 Migrated {} personal item(s) of {} into household '{}'",
                    moved,
                    user_id,
                    household.name
                );
                Ok(moved)
            }
            MigrationChoice::Discard => {
                let deleted = self.store.purge_scope(&personal).await?;
                log::info!(
                    "🗑️ Discarded {} personal item(s) of {}",
                    deleted,
                    user_id
                );
                self.events
                    .emit(EngineEvent::ScopePurged { scope: personal });
                Ok(deleted)
            }
        }
    }

    /// Remove a member. The household survives unless the member set becomes
    /// empty, in which case it is deleted with its items and activity. If the
    /// owner leaves a non-empty household, ownership passes to the
    /// longest-standing remaining member.
    pub async fn leave_household(
        &self,
        household_id: &str,
        user_id: &str,
    ) -> Result<(), HouseholdError> {
        let user = user_id.to_string();
        let household = self
            .store
            .update_household_atomic(household_id, &move |household| {
                if !household.has_member(&user) {
                    return Err(HouseholdError::Validation(ValidationError::new(
                        "user_id",
                        "not a member of this household",
                    )));
                }
                household.members.retain(|m| m != &user);
                if household.owner_id == user {
                    if let Some(next_owner) = household.members.first() {
                        household.owner_id = next_owner.clone();
                    }
                }
                Ok(())
            })
            .await?;

        self.events.emit(EngineEvent::MemberLeft {
            household_id: household.id.clone(),
            user_id: user_id.to_string(),
        });

        if household.members.is_empty() {
            log::info!(
                "🏚️ Household '{}' has no members left, deleting",
                household.name
            );
            self.cascade_delete(&household).await?;
        }
        Ok(())
    }

    /// Owner-only explicit deletion; cascades to all household items and
    /// activity.
    pub async fn delete_household(
        &self,
        household_id: &str,
        caller_id: &str,
    ) -> Result<(), HouseholdError> {
        let household = self.require_household(household_id).await?;
        if household.owner_id != caller_id {
            return Err(HouseholdError::NotOwner);
        }
        self.cascade_delete(&household).await
    }

    /// Denormalized member views, in member order. Members without a stored
    /// profile fall back to an id-only view.
    pub async fn members(&self, household_id: &str) -> Result<Vec<Member>, HouseholdError> {
        let household = self.require_household(household_id).await?;
        let profiles = self.store.member_profiles(&household.members).await?;
        Ok(household
            .members
            .iter()
            .map(|user_id| {
                profiles
                    .iter()
                    .find(|p| &p.user_id == user_id)
                    .cloned()
                    .unwrap_or_else(|| Member {
                        user_id: user_id.clone(),
                        name: user_id.clone(),
                        profile_picture_ref: None,
                    })
            })
            .collect())
    }

    pub async fn get_household(
        &self,
        household_id: &str,
    ) -> Result<Option<Household>, HouseholdError> {
        Ok(self.store.get_household(household_id).await?)
    }

    async fn require_household(&self, household_id: &str) -> Result<Household, HouseholdError> {
        self.store
            .get_household(household_id)
            .await?
            .ok_or_else(|| HouseholdError::NotFound(household_id.to_string()))
    }

    async fn cascade_delete(&self, household: &Household) -> Result<(), HouseholdError> {
        let scope = household.scope();
        let deleted = self.store.purge_scope(&scope).await?;
        self.store.delete_household(&household.id).await?;
        log::info!(
            "🧹 Deleted household '{}' and {} scoped item(s)",
            household.name,
            deleted
        );
        self.events.emit(EngineEvent::HouseholdDeleted {
            household_id: household.id.clone(),
        });
        Ok(())
    }
}

fn validate_household_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("name", "must not be empty"));
    }
    if !name.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return Err(ValidationError::new(
            "name",
            "must contain only letters and whitespace",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, FoodItem, StorageLocation, Unit};
    use crate::storage::{ActivityQuery, MemoryStore};

    fn manager() -> HouseholdMembershipManager<MemoryStore> {
        HouseholdMembershipManager::new(Arc::new(MemoryStore::new()))
    }

    fn create_test_item(id: &str, scope: OwnerScope) -> FoodItem {
        FoodItem {
            id: id.to_string(),
            scope,
            name: format!("item_{}", id),
            quantity: 1,
            unit: Unit::Piece,
            storage_location: StorageLocation::Fridge,
            category: Category::Other,
            expiry_timestamp: 1_900_000_000_000,
            consumed: false,
            thrown_away: false,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_create_household_validates_name() {
        let manager = manager();
        for bad in ["", "   ", "Flat 4", "Team#1"] {
            let err = manager
                .create_household(bad, HouseholdType::Family, "user1")
                .await
                .unwrap_err();
            assert!(
                matches!(err, HouseholdError::Validation(ref v) if v.field == "name"),
                "expected name validation failure for {:?}",
                bad
            );
        }

        let ok = manager
            .create_household("Shared Flat", HouseholdType::Family, "user1")
            .await
            .unwrap();
        assert_eq!(ok.members, vec!["user1".to_string()]);
        assert_eq!(ok.owner_id, "user1");
    }

    #[tokio::test]
    async fn test_create_household_rejects_existing_member() {
        let manager = manager();
        manager
            .create_household("First", HouseholdType::Family, "user1")
            .await
            .unwrap();
        let err = manager
            .create_household("Second", HouseholdType::Family, "user1")
            .await
            .unwrap_err();
        assert!(matches!(err, HouseholdError::AlreadyMember));
    }

    #[tokio::test]
    async fn test_single_household_is_immediately_full() {
        let manager = manager();
        let household = manager
            .create_household("Solo", HouseholdType::Single, "user1")
            .await
            .unwrap();

        let err = manager
            .join_household(&household.id, "user2")
            .await
            .unwrap_err();
        assert!(matches!(err, HouseholdError::Full));
    }

    #[tokio::test]
    async fn test_join_pair_household_until_full() {
        let manager = manager();
        let household = manager
            .create_household("Pair", HouseholdType::Pair, "user1")
            .await
            .unwrap();

        let joined = manager.join_household(&household.id, "user2").await.unwrap();
        assert_eq!(joined.members.len(), 2);

        let err = manager
            .join_household(&household.id, "user3")
            .await
            .unwrap_err();
        assert!(matches!(err, HouseholdError::Full));
    }

    #[tokio::test]
    async fn test_join_other_household_is_already_member() {
        let manager = manager();
        let first = manager
            .create_household("First", HouseholdType::Family, "user1")
            .await
            .unwrap();
        let second = manager
            .create_household("Second", HouseholdType::Family, "user2")
            .await
            .unwrap();

        let err = manager
            .join_household(&second.id, "user1")
            .await
            .unwrap_err();
        assert!(matches!(err, HouseholdError::AlreadyMember));

        // re-joining the own household is a no-op
        let same = manager.join_household(&first.id, "user1").await.unwrap();
        assert_eq!(same.members.len(), 1);
    }

    #[tokio::test]
    async fn test_join_rejects_malformed_token() {
        let manager = manager();
        let err = manager.join_household("tiny", "user1").await.unwrap_err();
        assert!(matches!(err, HouseholdError::Validation(_)));
    }

    #[tokio::test]
    async fn test_join_unknown_household_is_not_found() {
        let manager = manager();
        let err = manager
            .join_household(&"a".repeat(20), "user1")
            .await
            .unwrap_err();
        assert!(matches!(err, HouseholdError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_migration_choice_migrate() {
        let manager = manager();
        let personal = OwnerScope::User("user1".to_string());
        manager
            .store
            .put_item(&create_test_item("a", personal.clone()))
            .await
            .unwrap();

        assert!(manager.migration_required("user1").await.unwrap());

        let household = manager
            .create_household("Flat", HouseholdType::Family, "user1")
            .await
            .unwrap();
        let moved = manager
            .resolve_migration("user1", &household.id, MigrationChoice::Migrate)
            .await
            .unwrap();
        assert_eq!(moved, 1);

        assert_eq!(manager.personal_item_count("user1").await.unwrap(), 0);
        let household_items = manager
            .store
            .query_items(&ItemQuery::scoped(household.scope()))
            .await
            .unwrap();
        assert_eq!(household_items.len(), 1);
    }

    #[tokio::test]
    async fn test_migration_choice_discard() {
        let manager = manager();
        let personal = OwnerScope::User("user1".to_string());
        manager
            .store
            .put_item(&create_test_item("a", personal.clone()))
            .await
            .unwrap();

        let household = manager
            .create_household("Flat", HouseholdType::Family, "user1")
            .await
            .unwrap();
        let deleted = manager
            .resolve_migration("user1", &household.id, MigrationChoice::Discard)
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(manager.personal_item_count("user1").await.unwrap(), 0);
        assert!(manager
            .store
            .query_items(&ItemQuery::scoped(household.scope()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_no_migration_needed_without_personal_items() {
        let manager = manager();
        assert!(!manager.migration_required("user1").await.unwrap());
    }

    #[tokio::test]
    async fn test_leave_keeps_household_until_empty() {
        let manager = manager();
        let household = manager
            .create_household("Flat", HouseholdType::Family, "user1")
            .await
            .unwrap();
        manager.join_household(&household.id, "user2").await.unwrap();

        manager.leave_household(&household.id, "user2").await.unwrap();
        let remaining = manager
            .get_household(&household.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining.members, vec!["user1".to_string()]);

        // last member leaving deletes the household
        manager.leave_household(&household.id, "user1").await.unwrap();
        assert!(manager.get_household(&household.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_leaving_hands_off_ownership() {
        let manager = manager();
        let household = manager
            .create_household("Flat", HouseholdType::Family, "user1")
            .await
            .unwrap();
        manager.join_household(&household.id, "user2").await.unwrap();
        manager.join_household(&household.id, "user3").await.unwrap();

        manager.leave_household(&household.id, "user1").await.unwrap();
        let remaining = manager
            .get_household(&household.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining.owner_id, "user2");
    }

    #[tokio::test]
    async fn test_leave_by_non_member_fails() {
        let manager = manager();
        let household = manager
            .create_household("Flat", HouseholdType::Family, "user1")
            .await
            .unwrap();
        let err = manager
            .leave_household(&household.id, "stranger")
            .await
            .unwrap_err();
        assert!(matches!(err, HouseholdError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_household_is_owner_only_and_cascades() {
        let manager = manager();
        let household = manager
            .create_household("Flat", HouseholdType::Family, "user1")
            .await
            .unwrap();
        manager.join_household(&household.id, "user2").await.unwrap();
        manager
            .store
            .put_item(&create_test_item("a", household.scope()))
            .await
            .unwrap();

        let err = manager
            .delete_household(&household.id, "user2")
            .await
            .unwrap_err();
        assert!(matches!(err, HouseholdError::NotOwner));

        manager.delete_household(&household.id, "user1").await.unwrap();
        assert!(manager.get_household(&household.id).await.unwrap().is_none());
        assert!(manager
            .store
            .query_items(&ItemQuery::scoped(household.scope()))
            .await
            .unwrap()
            .is_empty());
        assert!(manager
            .store
            .query_activities(&ActivityQuery::scoped(household.scope()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_members_returns_profiles_with_fallback() {
        let manager = manager();
        let household = manager
            .create_household("Flat", HouseholdType::Family, "user1")
            .await
            .unwrap();
        manager.join_household(&household.id, "user2").await.unwrap();
        manager
            .store
            .put_member_profile(&Member {
                user_id: "user1".to_string(),
                name: "Alex".to_string(),
                profile_picture_ref: Some("pic_1".to_string()),
            })
            .await
            .unwrap();

        let members = manager.members(&household.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "Alex");
        assert_eq!(members[1].name, "user2"); // id-only fallback
    }
}
