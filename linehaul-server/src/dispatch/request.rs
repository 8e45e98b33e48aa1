//! Inputs and results of lifecycle operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DriverId, DriverTripReport, EquipmentId, EquipmentIssue, EquipmentKind, Loadsheet,
    MoraleRating, Trip,
};

use super::LifecycleError;

/// The driver crew for a trip. Absent fields clear the seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crew {
    #[serde(default)]
    pub driver: Option<DriverId>,
    #[serde(default)]
    pub team_driver: Option<DriverId>,
}

/// The units coupled to a trip. Absent fields clear the slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentSet {
    #[serde(default)]
    pub truck: Option<EquipmentId>,
    #[serde(default)]
    pub trailer: Option<EquipmentId>,
    #[serde(default)]
    pub trailer2: Option<EquipmentId>,
    #[serde(default)]
    pub dolly: Option<EquipmentId>,
}

/// Everything a dispatcher may attach when creating a trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripAssignments {
    #[serde(default, flatten)]
    pub crew: Crew,
    #[serde(default, flatten)]
    pub equipment: EquipmentSet,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A problem with a unit, reported at arrival.
///
/// Recorded only when all three fields are present and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    #[serde(default)]
    pub kind: Option<EquipmentKind>,
    #[serde(default)]
    pub unit_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl IssueReport {
    /// The three required parts, if every one is filled in.
    pub(crate) fn complete(&self) -> Option<(EquipmentKind, &str, &str)> {
        let unit = self.unit_number.as_deref().map(str::trim)?;
        let description = self.description.as_deref().map(str::trim)?;
        if unit.is_empty() || description.is_empty() {
            return None;
        }
        Some((self.kind?, unit, description))
    }
}

/// What the driver submits when arriving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrivalDetails {
    /// Defaults to the coordinator's clock.
    #[serde(default)]
    pub arrived_at: Option<DateTime<Utc>>,
    /// Defaults to the template distance.
    #[serde(default)]
    pub actual_miles: Option<f64>,
    #[serde(default)]
    pub drop_hooks: u32,
    #[serde(default)]
    pub chain_ups: u32,
    #[serde(default)]
    pub wait_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub wait_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub wait_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub issue: Option<IssueReport>,
    /// 1 to 5.
    #[serde(default)]
    pub morale: Option<u8>,
}

impl ArrivalDetails {
    pub(crate) fn validate(&self) -> Result<(), LifecycleError> {
        if let Some(rating) = self.morale {
            validate_rating(rating)?;
        }
        if let (Some(start), Some(end)) = (self.wait_start, self.wait_end)
            && end < start
        {
            return Err(LifecycleError::Validation(format!(
                "wait ended at {end} before it started at {start}"
            )));
        }
        if let Some(miles) = self.actual_miles
            && !(miles.is_finite() && miles >= 0.0)
        {
            return Err(LifecycleError::Validation(format!(
                "actual miles must be a non-negative number, got {miles}"
            )));
        }
        Ok(())
    }

    /// Whole minutes between the wait window's ends, when both are given.
    pub fn wait_minutes(&self) -> Option<i64> {
        match (self.wait_start, self.wait_end) {
            (Some(start), Some(end)) => Some((end - start).num_minutes()),
            _ => None,
        }
    }
}

pub(crate) fn validate_rating(rating: u8) -> Result<(), LifecycleError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(LifecycleError::Validation(format!(
            "morale rating must be between 1 and 5, got {rating}"
        )))
    }
}

/// Records produced by a successful arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrivalOutcome {
    pub trip: Trip,
    pub report: DriverTripReport,
    pub issue: Option<EquipmentIssue>,
    /// The trip's rating, whether created now or already on file.
    pub morale: Option<MoraleRating>,
    /// Loadsheets released at the destination.
    pub released: Vec<Loadsheet>,
}

/// A trip with the records hanging off it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripDetail {
    pub trip: Trip,
    pub loadsheets: Vec<Loadsheet>,
    pub reports: Vec<DriverTripReport>,
    pub issues: Vec<EquipmentIssue>,
    pub morale: Option<MoraleRating>,
}
