//! Data transfer objects for web requests and responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dispatch::{ArrivalDetails, TripAssignments};
use crate::domain::{DriverId, LoadsheetId, TerminalCode, TripNumber, TripStatus};
use crate::mileage::{Mileage, MileageSource};

/// Request to create a trip from a route template.
#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    /// Route template code, e.g. `DENSLC1`
    pub template: String,

    /// Dispatch date (YYYY-MM-DD)
    pub date: NaiveDate,

    /// Optional crew, equipment and notes
    #[serde(flatten)]
    pub assignments: TripAssignments,
}

#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    pub driver: DriverId,
    #[serde(default)]
    pub team_driver: Option<DriverId>,
}

/// Request to dispatch a trip.
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    /// The driver pressing "depart"
    pub driver: DriverId,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to record an arrival.
#[derive(Debug, Deserialize)]
pub struct ArriveRequest {
    /// The driver reporting the arrival
    pub driver: DriverId,

    #[serde(flatten)]
    pub details: ArrivalDetails,
}

#[derive(Debug, Deserialize)]
pub struct RateTripRequest {
    pub driver: DriverId,
    pub rating: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Administrative status change.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TripStatus,
}

#[derive(Debug, Deserialize)]
pub struct LinkLoadsheetRequest {
    pub loadsheet: LoadsheetId,
}

/// Response after deleting a trip.
#[derive(Debug, Serialize)]
pub struct DeleteTripResponse {
    /// The number freed by the deletion
    pub deleted: TripNumber,
}

/// Query for a mileage lookup.
#[derive(Debug, Deserialize)]
pub struct MileageQuery {
    /// Origin terminal code
    pub origin: String,

    /// Destination terminal code
    pub destination: String,
}

/// A resolved distance.
#[derive(Debug, Serialize)]
pub struct MileageResponse {
    pub origin: TerminalCode,
    pub destination: TerminalCode,
    pub miles: f64,
    /// `profile`, `matrix` or `gps`
    pub source: MileageSource,
}

impl MileageResponse {
    pub fn new(origin: TerminalCode, destination: TerminalCode, mileage: Mileage) -> Self {
        Self {
            origin,
            destination,
            miles: mileage.miles,
            source: mileage.source,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,

    /// Stable category a client can branch on
    pub kind: String,
}
