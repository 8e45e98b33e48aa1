//! Loadsheets and the append-only records written at arrival.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    DriverId, EquipmentKind, IssueId, LoadsheetId, RatingId, ReportId, TerminalCode, TripId,
};

/// A freight manifest, linked to a trip while it is on the road.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadsheet {
    pub id: LoadsheetId,
    pub manifest_number: String,
    /// Terminal the freight currently sits at.
    pub origin: TerminalCode,
    #[serde(default)]
    pub trailer_number: Option<String>,
    #[serde(default)]
    pub trip_id: Option<TripId>,
}

/// What a driver reports on arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverTripReport {
    pub id: ReportId,
    pub trip_id: TripId,
    pub driver_id: DriverId,
    pub arrived_at: DateTime<Utc>,
    pub drop_hooks: u32,
    pub chain_ups: u32,
    pub wait_start: Option<DateTime<Utc>>,
    pub wait_end: Option<DateTime<Utc>>,
    /// `wait_end - wait_start`, when both are known.
    pub wait_minutes: Option<i64>,
    pub wait_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentIssue {
    pub id: IssueId,
    pub trip_id: TripId,
    pub driver_id: DriverId,
    pub kind: EquipmentKind,
    pub unit_number: String,
    pub description: String,
    pub reported_at: DateTime<Utc>,
}

/// A 1-5 rating of how the trip went. At most one per trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoraleRating {
    pub id: RatingId,
    pub trip_id: TripId,
    pub driver_id: DriverId,
    pub rating: u8,
    pub rated_at: DateTime<Utc>,
}
