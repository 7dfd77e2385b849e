//! In-memory backend
//!
//! Reference implementation of the store contract. One mutex over the whole
//! state serializes every call, which makes the atomicity requirements
//! (item + activity writes, household read-modify-write, scope transfer)
//! hold trivially.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ActivityQuery, InventoryStore, ItemQuery, StoreError};
use crate::error::HouseholdError;
use crate::model::{ActivityRecord, FoodItem, Household, Member, OwnerScope};

#[derive(Default)]
struct MemoryState {
    items: HashMap<String, FoodItem>,
    activities: Vec<ActivityRecord>,
    households: HashMap<String, Household>,
    profiles: HashMap<String, Member>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn get_item(&self, id: &str) -> Result<Option<FoodItem>, StoreError> {
        Ok(self.lock()?.items.get(id).cloned())
    }

    async fn put_item(&self, item: &FoodItem) -> Result<(), StoreError> {
        self.lock()?.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        self.lock()?.items.remove(id);
        Ok(())
    }

    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<FoodItem>, StoreError> {
        Ok(self
            .lock()?
            .items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect())
    }

    async fn put_item_with_activities(
        &self,
        item: &FoodItem,
        records: &[ActivityRecord],
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.items.insert(item.id.clone(), item.clone());
        state.activities.extend_from_slice(records);
        Ok(())
    }

    async fn append_activity(&self, record: &ActivityRecord) -> Result<(), StoreError> {
        self.lock()?.activities.push(record.clone());
        Ok(())
    }

    async fn query_activities(
        &self,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        Ok(self
            .lock()?
            .activities
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    async fn get_household(&self, id: &str) -> Result<Option<Household>, StoreError> {
        Ok(self.lock()?.households.get(id).cloned())
    }

    async fn put_household(&self, household: &Household) -> Result<(), StoreError> {
        self.lock()?
            .households
            .insert(household.id.clone(), household.clone());
        Ok(())
    }

    async fn delete_household(&self, id: &str) -> Result<(), StoreError> {
        self.lock()?.households.remove(id);
        Ok(())
    }

    async fn household_for_user(&self, user_id: &str) -> Result<Option<Household>, StoreError> {
        Ok(self
            .lock()?
            .households
            .values()
            .find(|h| h.has_member(user_id))
            .cloned())
    }

    async fn update_household_atomic(
        &self,
        id: &str,
        mutate: &(dyn for<'a> Fn(&'a mut Household) -> Result<(), HouseholdError> + Send + Sync),
    ) -> Result<Household, HouseholdError> {
        let mut state = self
            .lock()
            .map_err(HouseholdError::from)?;
        // Mutate a copy; the stored document only changes on Ok.
        let mut household = state
            .households
            .get(id)
            .cloned()
            .ok_or_else(|| HouseholdError::NotFound(id.to_string()))?;
        mutate(&mut household)?;
        state
            .households
            .insert(household.id.clone(), household.clone());
        Ok(household)
    }

    async fn admit_member(
        &self,
        household_id: &str,
        user_id: &str,
    ) -> Result<(Household, bool), HouseholdError> {
        let mut state = self
            .lock()
            .map_err(HouseholdError::from)?;
        if state
            .households
            .values()
            .any(|h| h.id != household_id && h.has_member(user_id))
        {
            return Err(HouseholdError::AlreadyMember);
        }
        let mut household = state
            .households
            .get(household_id)
            .cloned()
            .ok_or_else(|| HouseholdError::NotFound(household_id.to_string()))?;
        if household.has_member(user_id) {
            return Ok((household, false));
        }
        if household.is_full() {
            return Err(HouseholdError::Full);
        }
        household.members.push(user_id.to_string());
        state
            .households
            .insert(household.id.clone(), household.clone());
        Ok((household, true))
    }

    async fn rescope(&self, from: &OwnerScope, to: &OwnerScope) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let mut moved = 0u64;
        for item in state.items.values_mut() {
            if &item.scope == from {
                item.scope = to.clone();
                moved += 1;
            }
        }
        for record in state.activities.iter_mut() {
            if &record.scope == from {
                record.scope = to.clone();
            }
        }
        Ok(moved)
    }

    async fn purge_scope(&self, scope: &OwnerScope) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let before = state.items.len();
        state.items.retain(|_, item| &item.scope != scope);
        let deleted = (before - state.items.len()) as u64;
        state.activities.retain(|record| &record.scope != scope);
        Ok(deleted)
    }

    async fn put_member_profile(&self, member: &Member) -> Result<(), StoreError> {
        self.lock()?
            .profiles
            .insert(member.user_id.clone(), member.clone());
        Ok(())
    }

    async fn member_profiles(&self, user_ids: &[String]) -> Result<Vec<Member>, StoreError> {
        let state = self.lock()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }
}
