//! SQLite backend
//!
//! Persistent implementation of the store contract. The schema is embedded
//! and idempotent (`IF NOT EXISTS` throughout), WAL mode is enabled on open,
//! and a single `Arc<Mutex<Connection>>` serializes writes — which is what
//! makes `update_household_atomic` and the multi-row operations race-free.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{ActivityQuery, InventoryStore, ItemQuery, StoreError};
use crate::error::HouseholdError;
use crate::model::{
    ActivityRecord, ActivityType, Category, FoodItem, Household, HouseholdType, Member,
    OwnerScope, StorageLocation, Unit,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS food_items (
    id               TEXT PRIMARY KEY,
    scope_kind       TEXT NOT NULL,
    scope_id         TEXT NOT NULL,
    name             TEXT NOT NULL,
    quantity         INTEGER NOT NULL,
    unit             TEXT NOT NULL,
    storage_location TEXT NOT NULL,
    category         TEXT NOT NULL,
    expiry_timestamp INTEGER NOT NULL,
    consumed         INTEGER NOT NULL DEFAULT 0,
    thrown_away      INTEGER NOT NULL DEFAULT 0,
    created_at       INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_food_items_scope ON food_items (scope_kind, scope_id);

CREATE TABLE IF NOT EXISTS activity_log (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id       TEXT NOT NULL,
    item_name     TEXT NOT NULL,
    scope_kind    TEXT NOT NULL,
    scope_id      TEXT NOT NULL,
    activity_type TEXT NOT NULL,
    timestamp     INTEGER NOT NULL,
    actor_id      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_activity_scope ON activity_log (scope_kind, scope_id, timestamp);

CREATE TABLE IF NOT EXISTS households (
    id             TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    household_type TEXT NOT NULL,
    members        TEXT NOT NULL,
    owner_id       TEXT NOT NULL,
    created_at     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS member_profiles (
    user_id             TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    profile_picture_ref TEXT
);
";

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn corrupt(what: &str, value: &str) -> StoreError {
    StoreError::Unavailable(format!("corrupt {} value in database: {}", what, value))
}

fn scope_parts(scope: &OwnerScope) -> (&'static str, &str) {
    match scope {
        OwnerScope::User(id) => ("user", id),
        OwnerScope::Household(id) => ("household", id),
    }
}

fn scope_from_parts(kind: &str, id: String) -> Result<OwnerScope, StoreError> {
    match kind {
        "user" => Ok(OwnerScope::User(id)),
        "household" => Ok(OwnerScope::Household(id)),
        other => Err(corrupt("scope_kind", other)),
    }
}

fn item_from_row(row: &Row<'_>) -> Result<FoodItem, StoreError> {
    let scope_kind: String = row.get("scope_kind").map_err(db_err)?;
    let scope_id: String = row.get("scope_id").map_err(db_err)?;
    let unit: String = row.get("unit").map_err(db_err)?;
    let storage_location: String = row.get("storage_location").map_err(db_err)?;
    let category: String = row.get("category").map_err(db_err)?;
    Ok(FoodItem {
        id: row.get("id").map_err(db_err)?,
        scope: scope_from_parts(&scope_kind, scope_id)?,
        name: row.get("name").map_err(db_err)?,
        quantity: row.get("quantity").map_err(db_err)?,
        unit: Unit::from_str(&unit).ok_or_else(|| corrupt("unit", &unit))?,
        storage_location: StorageLocation::from_str(&storage_location)
            .ok_or_else(|| corrupt("storage_location", &storage_location))?,
        category: Category::from_str(&category).ok_or_else(|| corrupt("category", &category))?,
        expiry_timestamp: row.get("expiry_timestamp").map_err(db_err)?,
        consumed: row.get::<_, i64>("consumed").map_err(db_err)? != 0,
        thrown_away: row.get::<_, i64>("thrown_away").map_err(db_err)? != 0,
        created_at: row.get("created_at").map_err(db_err)?,
    })
}

fn record_from_row(row: &Row<'_>) -> Result<ActivityRecord, StoreError> {
    let scope_kind: String = row.get("scope_kind").map_err(db_err)?;
    let scope_id: String = row.get("scope_id").map_err(db_err)?;
    let activity_type: String = row.get("activity_type").map_err(db_err)?;
    Ok(ActivityRecord {
        item_id: row.get("item_id").map_err(db_err)?,
        item_name: row.get("item_name").map_err(db_err)?,
        scope: scope_from_parts(&scope_kind, scope_id)?,
        activity_type: ActivityType::from_str(&activity_type)
            .ok_or_else(|| corrupt("activity_type", &activity_type))?,
        timestamp: row.get("timestamp").map_err(db_err)?,
        actor_id: row.get("actor_id").map_err(db_err)?,
    })
}

fn household_from_row(row: &Row<'_>) -> Result<Household, StoreError> {
    let household_type: String = row.get("household_type").map_err(db_err)?;
    let members_json: String = row.get("members").map_err(db_err)?;
    Ok(Household {
        id: row.get("id").map_err(db_err)?,
        name: row.get("name").map_err(db_err)?,
        household_type: HouseholdType::from_str(&household_type)
            .ok_or_else(|| corrupt("household_type", &household_type))?,
        members: serde_json::from_str(&members_json)?,
        owner_id: row.get("owner_id").map_err(db_err)?,
        created_at: row.get("created_at").map_err(db_err)?,
    })
}

fn insert_item(conn: &Connection, item: &FoodItem) -> Result<(), StoreError> {
    let (scope_kind, scope_id) = scope_parts(&item.scope);
    conn.execute(
        "INSERT INTO food_items
            (id, scope_kind, scope_id, name, quantity, unit, storage_location,
             category, expiry_timestamp, consumed, thrown_away, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
            scope_kind = excluded.scope_kind,
            scope_id = excluded.scope_id,
            name = excluded.name,
            quantity = excluded.quantity,
            unit = excluded.unit,
            storage_location = excluded.storage_location,
            category = excluded.category,
            expiry_timestamp = excluded.expiry_timestamp,
            consumed = excluded.consumed,
            thrown_away = excluded.thrown_away,
            created_at = excluded.created_at",
        params![
            item.id,
            scope_kind,
            scope_id,
            item.name,
            item.quantity,
            item.unit.as_str(),
            item.storage_location.as_str(),
            item.category.as_str(),
            item.expiry_timestamp,
            item.consumed as i64,
            item.thrown_away as i64,
            item.created_at,
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

fn insert_activity(conn: &Connection, record: &ActivityRecord) -> Result<(), StoreError> {
    let (scope_kind, scope_id) = scope_parts(&record.scope);
    conn.execute(
        "INSERT INTO activity_log
            (item_id, item_name, scope_kind, scope_id, activity_type, timestamp, actor_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.item_id,
            record.item_name,
            scope_kind,
            scope_id,
            record.activity_type.as_str(),
            record.timestamp,
            record.actor_id,
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

fn insert_household(conn: &Connection, household: &Household) -> Result<(), StoreError> {
    let members_json = serde_json::to_string(&household.members)?;
    conn.execute(
        "INSERT INTO households (id, name, household_type, members, owner_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            household_type = excluded.household_type,
            members = excluded.members,
            owner_id = excluded.owner_id,
            created_at = excluded.created_at",
        params![
            household.id,
            household.name,
            household.household_type.as_str(),
            members_json,
            household.owner_id,
            household.created_at,
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

impl SqliteStore {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        log::info!("✅ SQLite inventory store initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryStore for SqliteStore {
    async fn get_item(&self, id: &str) -> Result<Option<FoodItem>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT * FROM food_items WHERE id = ?1")
            .map_err(db_err)?;
        let mut rows = stmt.query(params![id]).map_err(db_err)?;
        match rows.next().map_err(db_err)? {
            Some(row) => Ok(Some(item_from_row(row)?)),
            None => Ok(None),
        }
    }

    async fn put_item(&self, item: &FoodItem) -> Result<(), StoreError> {
        let conn = self.lock()?;
        insert_item(&conn, item)
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM food_items WHERE id = ?1", params![id])
            .map_err(db_err)?;
        Ok(())
    }

    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<FoodItem>, StoreError> {
        let mut sql = "SELECT * FROM food_items WHERE 1=1".to_string();
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(ref scope) = query.scope {
            let (kind, id) = scope_parts(scope);
            sql.push_str(" AND scope_kind = ? AND scope_id = ?");
            args.push(Box::new(kind.to_string()));
            args.push(Box::new(id.to_string()));
        }
        if let Some(location) = query.storage_location {
            sql.push_str(" AND storage_location = ?");
            args.push(Box::new(location.as_str().to_string()));
        }
        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            args.push(Box::new(category.as_str().to_string()));
        }
        if let Some(consumed) = query.consumed {
            sql.push_str(" AND consumed = ?");
            args.push(Box::new(consumed as i64));
        }
        if let Some(thrown_away) = query.thrown_away {
            sql.push_str(" AND thrown_away = ?");
            args.push(Box::new(thrown_away as i64));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt
            .query(rusqlite::params_from_iter(args.iter()))
            .map_err(db_err)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            items.push(item_from_row(row)?);
        }
        Ok(items)
    }

    async fn put_item_with_activities(
        &self,
        item: &FoodItem,
        records: &[ActivityRecord],
    ) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        insert_item(&tx, item)?;
        for record in records {
            insert_activity(&tx, record)?;
        }
        tx.commit().map_err(db_err)?;
        Ok(())
    }

    async fn append_activity(&self, record: &ActivityRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        insert_activity(&conn, record)
    }

    async fn query_activities(
        &self,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        let mut sql = "SELECT * FROM activity_log WHERE 1=1".to_string();
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(ref scope) = query.scope {
            let (kind, id) = scope_parts(scope);
            sql.push_str(" AND scope_kind = ? AND scope_id = ?");
            args.push(Box::new(kind.to_string()));
            args.push(Box::new(id.to_string()));
        }
        if let Some(ref item_id) = query.item_id {
            sql.push_str(" AND item_id = ?");
            args.push(Box::new(item_id.clone()));
        }
        if let Some(activity_type) = query.activity_type {
            sql.push_str(" AND activity_type = ?");
            args.push(Box::new(activity_type.as_str().to_string()));
        }
        if let Some(since) = query.since {
            sql.push_str(" AND timestamp >= ?");
            args.push(Box::new(since));
        }
        if let Some(until) = query.until {
            sql.push_str(" AND timestamp < ?");
            args.push(Box::new(until));
        }
        sql.push_str(" ORDER BY seq");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt
            .query(rusqlite::params_from_iter(args.iter()))
            .map_err(db_err)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            records.push(record_from_row(row)?);
        }
        Ok(records)
    }

    async fn get_household(&self, id: &str) -> Result<Option<Household>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT * FROM households WHERE id = ?1")
            .map_err(db_err)?;
        let mut rows = stmt.query(params![id]).map_err(db_err)?;
        match rows.next().map_err(db_err)? {
            Some(row) => Ok(Some(household_from_row(row)?)),
            None => Ok(None),
        }
    }

    async fn put_household(&self, household: &Household) -> Result<(), StoreError> {
        let conn = self.lock()?;
        insert_household(&conn, household)
    }

    async fn delete_household(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM households WHERE id = ?1", params![id])
            .map_err(db_err)?;
        Ok(())
    }

    async fn household_for_user(&self, user_id: &str) -> Result<Option<Household>, StoreError> {
        // Member lists are small JSON arrays; decode and check in process.
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT * FROM households").map_err(db_err)?;
        let mut rows = stmt.query([]).map_err(db_err)?;
        while let Some(row) = rows.next().map_err(db_err)? {
            let household = household_from_row(row)?;
            if household.has_member(user_id) {
                return Ok(Some(household));
            }
        }
        Ok(None)
    }

    async fn update_household_atomic(
        &self,
        id: &str,
        mutate: &(dyn for<'a> Fn(&'a mut Household) -> Result<(), HouseholdError> + Send + Sync),
    ) -> Result<Household, HouseholdError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        let mut household = {
            let mut stmt = tx
                .prepare("SELECT * FROM households WHERE id = ?1")
                .map_err(db_err)?;
            let found = stmt
                .query_row(params![id], |row| {
                    // Defer decode errors until after the rusqlite layer.
                    Ok(household_from_row(row))
                })
                .optional()
                .map_err(db_err)?;
            match found {
                Some(decoded) => decoded?,
                None => return Err(HouseholdError::NotFound(id.to_string())),
            }
        };
        mutate(&mut household)?;
        insert_household(&tx, &household)?;
        tx.commit().map_err(db_err)?;
        Ok(household)
    }

    async fn admit_member(
        &self,
        household_id: &str,
        user_id: &str,
    ) -> Result<(Household, bool), HouseholdError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        let mut target = None;
        {
            let mut stmt = tx.prepare("SELECT * FROM households").map_err(db_err)?;
            let mut rows = stmt.query([]).map_err(db_err)?;
            while let Some(row) = rows.next().map_err(db_err)? {
                let household = household_from_row(row)?;
                if household.id != household_id && household.has_member(user_id) {
                    return Err(HouseholdError::AlreadyMember);
                }
                if household.id == household_id {
                    target = Some(household);
                }
            }
        }
        let mut household =
            target.ok_or_else(|| HouseholdError::NotFound(household_id.to_string()))?;
        if household.has_member(user_id) {
            return Ok((household, false));
        }
        if household.is_full() {
            return Err(HouseholdError::Full);
        }
        household.members.push(user_id.to_string());
        insert_household(&tx, &household)?;
        tx.commit().map_err(db_err)?;
        Ok((household, true))
    }

    async fn rescope(&self, from: &OwnerScope, to: &OwnerScope) -> Result<u64, StoreError> {
        let (from_kind, from_id) = scope_parts(from);
        let (to_kind, to_id) = scope_parts(to);
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        let moved = tx
            .execute(
                "UPDATE food_items SET scope_kind = ?1, scope_id = ?2
                 WHERE scope_kind = ?3 AND scope_id = ?4",
                params![to_kind, to_id, from_kind, from_id],
            )
            .map_err(db_err)?;
        tx.execute(
            "UPDATE activity_log SET scope_kind = ?1, scope_id = ?2
             WHERE scope_kind = ?3 AND scope_id = ?4",
            params![to_kind, to_id, from_kind, from_id],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        Ok(moved as u64)
    }

    async fn purge_scope(&self, scope: &OwnerScope) -> Result<u64, StoreError> {
        let (kind, id) = scope_parts(scope);
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        let deleted = tx
            .execute(
                "DELETE FROM food_items WHERE scope_kind = ?1 AND scope_id = ?2",
                params![kind, id],
            )
            .map_err(db_err)?;
        tx.execute(
            "DELETE FROM activity_log WHERE scope_kind = ?1 AND scope_id = ?2",
            params![kind, id],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        Ok(deleted as u64)
    }

    async fn put_member_profile(&self, member: &Member) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO member_profiles (user_id, name, profile_picture_ref)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                name = excluded.name,
                profile_picture_ref = excluded.profile_picture_ref",
            params![member.user_id, member.name, member.profile_picture_ref],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn member_profiles(&self, user_ids: &[String]) -> Result<Vec<Member>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT user_id, name, profile_picture_ref FROM member_profiles WHERE user_id = ?1")
            .map_err(db_err)?;
        let mut members = Vec::new();
        for user_id in user_ids {
            let found = stmt
                .query_row(params![user_id], |row| {
                    Ok(Member {
                        user_id: row.get(0)?,
                        name: row.get(1)?,
                        profile_picture_ref: row.get(2)?,
                    })
                })
                .optional()
                .map_err(db_err)?;
            if let Some(member) = found {
                members.push(member);
            }
        }
        Ok(members)
    }
}
