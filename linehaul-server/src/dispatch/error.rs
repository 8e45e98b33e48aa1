//! Lifecycle error types.

use std::fmt;

use serde::Serialize;

use crate::domain::{
    DriverId, EquipmentId, LoadsheetId, TemplateCode, TripId, TripNumber, TripStatus,
};
use crate::store::{ResourceKey, StoreError};

/// Coarse error category, stable enough for a UI to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Unauthorized,
    Conflict,
    ValidationFailed,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::Storage => "storage",
        })
    }
}

/// Errors from trip lifecycle operations.
///
/// A failed operation never leaves partial writes behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    #[error("route template {0} not found")]
    TemplateNotFound(TemplateCode),

    #[error("trip {0} not found")]
    TripNotFound(TripId),

    #[error("driver {0} not found")]
    DriverNotFound(DriverId),

    #[error("equipment unit {0} not found")]
    EquipmentNotFound(EquipmentId),

    #[error("loadsheet {0} not found")]
    LoadsheetNotFound(LoadsheetId),

    /// The acting driver is neither the primary nor the team driver.
    #[error("driver {driver} is not assigned to trip {trip}")]
    NotAssignedToTrip { trip: TripNumber, driver: DriverId },

    /// The trip's status does not allow the operation.
    #[error("cannot {operation} trip {trip}: status is {status}, expected {expected}")]
    InvalidState {
        trip: TripNumber,
        operation: &'static str,
        status: TripStatus,
        expected: &'static str,
    },

    /// An administrative update asked for an edge the state machine lacks.
    #[error("trip {trip} cannot move from {from} to {to}")]
    ForbiddenTransition {
        trip: TripNumber,
        from: TripStatus,
        to: TripStatus,
    },

    /// The allocated number was taken by a concurrent create. Retried.
    #[error("trip number {0} is already taken")]
    DuplicateTripNumber(TripNumber),

    /// Allocation kept colliding until the retry budget ran out.
    #[error("no unique trip number for {prefix}* after {attempts} attempts")]
    TripNumberConflict { prefix: String, attempts: u32 },

    #[error("{resource} is already assigned to trip {holder}")]
    ResourceBusy { resource: ResourceKey, holder: TripId },

    /// Linked loadsheets protect a trip from deletion.
    #[error("trip {trip} has {count} linked loadsheet(s)")]
    HasDependents { trip: TripNumber, count: usize },

    #[error("loadsheet {loadsheet} is already linked to trip {trip}")]
    LoadsheetLinked { loadsheet: LoadsheetId, trip: TripId },

    #[error("trip {0} was changed by someone else; reload and retry")]
    ConcurrentModification(TripId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::TemplateNotFound(_)
            | LifecycleError::TripNotFound(_)
            | LifecycleError::DriverNotFound(_)
            | LifecycleError::EquipmentNotFound(_)
            | LifecycleError::LoadsheetNotFound(_) => ErrorKind::NotFound,
            LifecycleError::NotAssignedToTrip { .. } => ErrorKind::Unauthorized,
            LifecycleError::InvalidState { .. } | LifecycleError::ForbiddenTransition { .. } => {
                ErrorKind::InvalidState
            }
            LifecycleError::DuplicateTripNumber(_)
            | LifecycleError::TripNumberConflict { .. }
            | LifecycleError::ResourceBusy { .. }
            | LifecycleError::HasDependents { .. }
            | LifecycleError::LoadsheetLinked { .. }
            | LifecycleError::ConcurrentModification(_) => ErrorKind::Conflict,
            LifecycleError::Validation(_) => ErrorKind::ValidationFailed,
            LifecycleError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Re-label a missing reference as a validation failure, for inputs
    /// where the caller supplied the id.
    pub(crate) fn into_validation(self) -> Self {
        match self.kind() {
            ErrorKind::NotFound => LifecycleError::Validation(self.to_string()),
            _ => self,
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateTripNumber(number) => LifecycleError::DuplicateTripNumber(number),
            StoreError::SerializationFailure(trip) => LifecycleError::ConcurrentModification(trip),
            StoreError::ResourceHeld { resource, holder } => {
                LifecycleError::ResourceBusy { resource, holder }
            }
            other => LifecycleError::Storage(other),
        }
    }
}
