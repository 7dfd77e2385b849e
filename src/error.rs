//! Typed failures surfaced by the managers
//!
//! No error here is fatal to the process and none is retried internally:
//! validation and invariant violations go straight back to the caller,
//! storage failures surface as a single generic variant.

use crate::storage::StoreError;

/// Bad input, with the failing field identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Failures of item lifecycle operations.
#[derive(Debug)]
pub enum LifecycleError {
    Validation(ValidationError),
    /// No item with the given id.
    NotFound(String),
    Storage(StoreError),
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::Validation(e) => write!(f, "{}", e),
            LifecycleError::NotFound(id) => write!(f, "item not found: {}", id),
            LifecycleError::Storage(e) => write!(f, "storage unavailable: {}", e),
        }
    }
}

impl std::error::Error for LifecycleError {}

impl From<ValidationError> for LifecycleError {
    fn from(err: ValidationError) -> Self {
        LifecycleError::Validation(err)
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        LifecycleError::Storage(err)
    }
}

/// Failures of household membership operations. `Full` and `AlreadyMember`
/// are decision points for the caller, never silently dropped.
#[derive(Debug)]
pub enum HouseholdError {
    Validation(ValidationError),
    /// No household with the given id.
    NotFound(String),
    /// The member set is at capacity for the household type.
    Full,
    /// The user already belongs to a household.
    AlreadyMember,
    /// The caller is not the owner of the household.
    NotOwner,
    Storage(StoreError),
}

impl std::fmt::Display for HouseholdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HouseholdError::Validation(e) => write!(f, "{}", e),
            HouseholdError::NotFound(id) => write!(f, "household not found: {}", id),
            HouseholdError::Full => write!(f, "household is full"),
            HouseholdError::AlreadyMember => write!(f, "user already belongs to a household"),
            HouseholdError::NotOwner => write!(f, "operation requires household ownership"),
            HouseholdError::Storage(e) => write!(f, "storage unavailable: {}", e),
        }
    }
}

impl std::error::Error for HouseholdError {}

impl From<ValidationError> for HouseholdError {
    fn from(err: ValidationError) -> Self {
        HouseholdError::Validation(err)
    }
}

impl From<StoreError> for HouseholdError {
    fn from(err: StoreError) -> Self {
        HouseholdError::Storage(err)
    }
}
