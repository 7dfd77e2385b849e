//! Domain types shared by every module
//!
//! Wire codes (the `as_str` forms) are the stable identifiers used by storage
//! backends and collaborators; the enums exist so unknown codes fail at the
//! boundary instead of flowing through as bare strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Ownership boundary for items and activity: a personal user scope or a
/// shared household scope. An item belongs to exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum OwnerScope {
    User(String),
    Household(String),
}

impl OwnerScope {
    pub fn id(&self) -> &str {
        match self {
            OwnerScope::User(id) => id,
            OwnerScope::Household(id) => id,
        }
    }
}

impl std::fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerScope::User(id) => write!(f, "user:{}", id),
            OwnerScope::Household(id) => write!(f, "household:{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Grams,
    Kilograms,
    Millilitres,
    Litres,
    Piece,
    Package,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Kilograms => "kg",
            Unit::Millilitres => "ml",
            Unit::Litres => "l",
            Unit::Piece => "piece",
            Unit::Package => "package",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "g" => Some(Unit::Grams),
            "kg" => Some(Unit::Kilograms),
            "ml" => Some(Unit::Millilitres),
            "l" => Some(Unit::Litres),
            "piece" => Some(Unit::Piece),
            "package" => Some(Unit::Package),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLocation {
    Fridge,
    Cupboard,
    Freezer,
    CounterTop,
    Cellar,
    BreadBox,
    SpiceRack,
    Pantry,
    FruitBasket,
    Other,
}

impl StorageLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageLocation::Fridge => "fridge",
            StorageLocation::Cupboard => "cupboard",
            StorageLocation::Freezer => "freezer",
            StorageLocation::CounterTop => "counter_top",
            StorageLocation::Cellar => "cellar",
            StorageLocation::BreadBox => "bread_box",
            StorageLocation::SpiceRack => "spice_rack",
            StorageLocation::Pantry => "pantry",
            StorageLocation::FruitBasket => "fruit_basket",
            StorageLocation::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|loc| loc.as_str() == s)
    }

    /// Static asset identifier for this location. Every variant maps to an
    /// explicit icon; unknown wire codes never reach this point because
    /// `from_str` rejects them.
    pub fn icon(&self) -> &'static str {
        match self {
            StorageLocation::Fridge => "icon_fridge",
            StorageLocation::Cupboard => "icon_cupboard",
            StorageLocation::Freezer => "icon_freezer",
            StorageLocation::CounterTop => "icon_counter_top",
            StorageLocation::Cellar => "icon_cellar",
            StorageLocation::BreadBox => "icon_bread_box",
            StorageLocation::SpiceRack => "icon_spice_rack",
            StorageLocation::Pantry => "icon_pantry",
            StorageLocation::FruitBasket => "icon_fruit_basket",
            StorageLocation::Other => "icon_other",
        }
    }

    pub fn all() -> [StorageLocation; 10] {
        [
            StorageLocation::Fridge,
            StorageLocation::Cupboard,
            StorageLocation::Freezer,
            StorageLocation::CounterTop,
            StorageLocation::Cellar,
            StorageLocation::BreadBox,
            StorageLocation::SpiceRack,
            StorageLocation::Pantry,
            StorageLocation::FruitBasket,
            StorageLocation::Other,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    DairyGoods,
    Vegetables,
    Fruits,
    Meat,
    Fish,
    FrozenGoods,
    Spices,
    Bread,
    Confectionery,
    Drinks,
    Pasta,
    CannedGoods,
    Candy,
    Groats,
    Sauces,
    PetFood,
    ChildFood,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DairyGoods => "dairy_goods",
            Category::Vegetables => "vegetables",
            Category::Fruits => "fruits",
            Category::Meat => "meat",
            Category::Fish => "fish",
            Category::FrozenGoods => "frozen_goods",
            Category::Spices => "spices",
            Category::Bread => "bread",
            Category::Confectionery => "confectionery",
            Category::Drinks => "drinks",
            Category::Pasta => "pasta",
            Category::CannedGoods => "canned_goods",
            Category::Candy => "candy",
            Category::Groats => "groats",
            Category::Sauces => "sauces",
            Category::PetFood => "pet_food",
            Category::ChildFood => "child_food",
            Category::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|c| c.as_str() == s)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::DairyGoods => "icon_dairy_goods",
            Category::Vegetables => "icon_vegetables",
            Category::Fruits => "icon_fruits",
            Category::Meat => "icon_meat",
            Category::Fish => "icon_fish",
            Category::FrozenGoods => "icon_frozen_goods",
            Category::Spices => "icon_spices",
            Category::Bread => "icon_bread",
            Category::Confectionery => "icon_confectionery",
            Category::Drinks => "icon_drinks",
            Category::Pasta => "icon_pasta",
            Category::CannedGoods => "icon_canned_goods",
            Category::Candy => "icon_candy",
            Category::Groats => "icon_groats",
            Category::Sauces => "icon_sauces",
            Category::PetFood => "icon_pet_food",
            Category::ChildFood => "icon_child_food",
            Category::Other => "icon_other",
        }
    }

    pub fn all() -> [Category; 18] {
        [
            Category::DairyGoods,
            Category::Vegetables,
            Category::Fruits,
            Category::Meat,
            Category::Fish,
            Category::FrozenGoods,
            Category::Spices,
            Category::Bread,
            Category::Confectionery,
            Category::Drinks,
            Category::Pasta,
            Category::CannedGoods,
            Category::Candy,
            Category::Groats,
            Category::Sauces,
            Category::PetFood,
            Category::ChildFood,
            Category::Other,
        ]
    }
}

/// A tracked food item. `consumed` and `thrown_away` are never both true;
/// an item with neither set is active and eligible for expiry bucketing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub scope: OwnerScope,
    pub name: String,
    pub quantity: u32,
    pub unit: Unit,
    pub storage_location: StorageLocation,
    pub category: Category,
    /// Epoch millis; date-only semantics, time-of-day is ignored for bucketing.
    pub expiry_timestamp: i64,
    pub consumed: bool,
    pub thrown_away: bool,
    pub created_at: i64,
}

impl FoodItem {
    pub fn is_active(&self) -> bool {
        !self.consumed && !self.thrown_away
    }

    /// Calendar date of expiry (UTC), dropping the time component.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        date_of_millis(self.expiry_timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    ProductAdded,
    Consumed,
    ThrownAway,
    Name,
    QuantityIncreased,
    QuantityDecreased,
    Expiry,
    Storage,
    Category,
    Edit,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::ProductAdded => "product_added",
            ActivityType::Consumed => "consumed",
            ActivityType::ThrownAway => "thrown_away",
            ActivityType::Name => "name",
            ActivityType::QuantityIncreased => "quantity_increased",
            ActivityType::QuantityDecreased => "quantity_decreased",
            ActivityType::Expiry => "expiry",
            ActivityType::Storage => "storage",
            ActivityType::Category => "category",
            ActivityType::Edit => "edit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "product_added" => Some(ActivityType::ProductAdded),
            "consumed" => Some(ActivityType::Consumed),
            "thrown_away" => Some(ActivityType::ThrownAway),
            "name" => Some(ActivityType::Name),
            "quantity_increased" => Some(ActivityType::QuantityIncreased),
            "quantity_decreased" => Some(ActivityType::QuantityDecreased),
            "expiry" => Some(ActivityType::Expiry),
            "storage" => Some(ActivityType::Storage),
            "category" => Some(ActivityType::Category),
            "edit" => Some(ActivityType::Edit),
            _ => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActivityType::ProductAdded => "icon_plus",
            ActivityType::Consumed | ActivityType::ThrownAway => "icon_remove",
            ActivityType::Name | ActivityType::Edit => "icon_edit",
            ActivityType::QuantityIncreased
            | ActivityType::QuantityDecreased
            | ActivityType::Expiry
            | ActivityType::Storage
            | ActivityType::Category => "icon_update",
        }
    }
}

/// Append-only log entry for one lifecycle mutation. The sole input to
/// statistics; never mutated or deleted (except by scope cascade deletion).
///
/// `item_name` is snapshotted at write time so aggregation never depends on
/// the item's current document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub item_id: String,
    pub item_name: String,
    pub scope: OwnerScope,
    pub activity_type: ActivityType,
    pub timestamp: i64,
    pub actor_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HouseholdType {
    Single,
    Pair,
    SharedApartment,
    Family,
}

impl HouseholdType {
    /// Maximum member count, `None` = unbounded (any practical cap is a UI
    /// concern, not enforced here).
    pub fn capacity(&self) -> Option<usize> {
        match self {
            HouseholdType::Single => Some(1),
            HouseholdType::Pair => Some(2),
            HouseholdType::SharedApartment | HouseholdType::Family => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HouseholdType::Single => "single",
            HouseholdType::Pair => "pair",
            HouseholdType::SharedApartment => "shared_apartment",
            HouseholdType::Family => "family",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "single" => Some(HouseholdType::Single),
            "pair" => Some(HouseholdType::Pair),
            "shared_apartment" => Some(HouseholdType::SharedApartment),
            "family" => Some(HouseholdType::Family),
            _ => None,
        }
    }
}

/// A household. The id doubles as the invite token (20-char opaque string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: String,
    pub name: String,
    pub household_type: HouseholdType,
    /// Member user ids, insertion order preserved. Set semantics.
    pub members: Vec<String>,
    pub owner_id: String,
    pub created_at: i64,
}

impl Household {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    pub fn is_full(&self) -> bool {
        match self.household_type.capacity() {
            Some(cap) => self.members.len() >= cap,
            None => false,
        }
    }

    pub fn scope(&self) -> OwnerScope {
        OwnerScope::Household(self.id.clone())
    }
}

/// Denormalized view of a household participant, served by the store's
/// profile collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub name: String,
    pub profile_picture_ref: Option<String>,
}

/// Calendar date (UTC) of an epoch-millis timestamp. `None` for timestamps
/// outside chrono's representable range.
pub fn date_of_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

/// Current wall-clock time as epoch millis (UTC).
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Length of generated document ids; also the invite-token length, since a
/// household's id doubles as its invite token.
pub const DOCUMENT_ID_LEN: usize = 20;

/// Random 20-character alphanumeric document id.
pub fn generate_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..DOCUMENT_ID_LEN)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect()
}
