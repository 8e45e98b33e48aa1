//! Status enums for trips, equipment and drivers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a trip.
///
/// ```text
/// PLANNED → ASSIGNED → DISPATCHED → IN_TRANSIT → ARRIVED → COMPLETED
///              └───────────────────────↗
/// any non-terminal ──────────────────────────→ CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Planned,
    Assigned,
    Dispatched,
    InTransit,
    Arrived,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub const ALL: [TripStatus; 7] = [
        TripStatus::Planned,
        TripStatus::Assigned,
        TripStatus::Dispatched,
        TripStatus::InTransit,
        TripStatus::Arrived,
        TripStatus::Completed,
        TripStatus::Cancelled,
    ];

    /// Terminal statuses cannot be cancelled or reassigned.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TripStatus::Arrived | TripStatus::Completed | TripStatus::Cancelled
        )
    }

    /// Whether `self → next` is a permitted edge of the state machine.
    pub fn can_transition_to(self, next: TripStatus) -> bool {
        use TripStatus::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Planned, Assigned) => true,
            (Assigned, Dispatched | InTransit) => true,
            (Dispatched, InTransit) => true,
            (InTransit, Arrived) => true,
            (Arrived, Completed) => true,
            _ => false,
        }
    }

    /// Equipment status implied by a trip entering this status, if any.
    pub fn implied_equipment_status(self) -> Option<EquipmentStatus> {
        match self {
            TripStatus::Dispatched => Some(EquipmentStatus::Dispatched),
            TripStatus::InTransit => Some(EquipmentStatus::InTransit),
            TripStatus::Arrived | TripStatus::Completed | TripStatus::Cancelled => {
                Some(EquipmentStatus::Available)
            }
            TripStatus::Planned | TripStatus::Assigned => None,
        }
    }

    /// Driver status implied by a trip entering this status, if any.
    pub fn implied_driver_status(self) -> Option<DriverStatus> {
        match self {
            TripStatus::Dispatched => Some(DriverStatus::OnDuty),
            TripStatus::InTransit => Some(DriverStatus::Driving),
            TripStatus::Arrived | TripStatus::Completed | TripStatus::Cancelled => {
                Some(DriverStatus::Available)
            }
            TripStatus::Planned | TripStatus::Assigned => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripStatus::Planned => "PLANNED",
            TripStatus::Assigned => "ASSIGNED",
            TripStatus::Dispatched => "DISPATCHED",
            TripStatus::InTransit => "IN_TRANSIT",
            TripStatus::Arrived => "ARRIVED",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of a truck, trailer or dolly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentStatus {
    Available,
    Dispatched,
    InTransit,
    /// Dropped at a terminal, neither busy nor offered for dispatch.
    /// Trailers and dollies only.
    Parked,
}

impl EquipmentStatus {
    /// Busy units are held by exactly one non-terminal trip.
    pub fn is_busy(self) -> bool {
        matches!(self, EquipmentStatus::Dispatched | EquipmentStatus::InTransit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Available,
    OnDuty,
    Driving,
}

/// The three kinds of equipment unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentKind {
    Truck,
    Trailer,
    Dolly,
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EquipmentKind::Truck => "truck",
            EquipmentKind::Trailer => "trailer",
            EquipmentKind::Dolly => "dolly",
        })
    }
}
