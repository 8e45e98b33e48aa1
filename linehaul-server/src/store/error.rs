//! Store error types.

use crate::domain::{TemplateCode, TripId, TripNumber};

use super::ResourceKey;

/// Errors raised by a [`super::Store`] when reading or committing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Unique index on trip numbers rejected an insert.
    #[error("trip number {0} already exists")]
    DuplicateTripNumber(TripNumber),

    /// Unique index on template codes rejected an insert.
    #[error("route template {0} already exists")]
    DuplicateTemplateCode(TemplateCode),

    /// A trip row changed between being read and being written.
    #[error("trip {0} was modified by a concurrent transaction")]
    SerializationFailure(TripId),

    /// Only one morale rating may exist per trip.
    #[error("trip {0} already has a morale rating")]
    DuplicateMoraleRating(TripId),

    /// A ledger hold collided with one owned by another trip.
    #[error("{resource} is already held by trip {holder}")]
    ResourceHeld { resource: ResourceKey, holder: TripId },

    /// A write referenced a row that does not exist.
    #[error("{table} row {id} does not exist")]
    MissingRow { table: &'static str, id: String },

    /// Commit aborted by an injected fault.
    #[error("commit aborted before write {0}")]
    InjectedFault(usize),

    /// A writer panicked while holding the store lock.
    #[error("store is unavailable: lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn missing(table: &'static str, id: impl ToString) -> Self {
        StoreError::MissingRow {
            table,
            id: id.to_string(),
        }
    }
}
