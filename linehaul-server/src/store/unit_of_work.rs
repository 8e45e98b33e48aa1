//! The list of writes a transition intends to make.
//!
//! A transition builds its whole `UnitOfWork` against one consistent view,
//! then hands it to the store, which applies every write or none.

use crate::domain::{
    DriverId, DriverStatus, DriverTripReport, EquipmentId, EquipmentIssue, EquipmentStatus,
    LegacyRoute, Loadsheet, MoraleRating, RouteTemplate, Trip, TripId,
};

use super::ResourceKey;

/// A single intended write.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Insert a new trip. Fails on a duplicate trip number.
    InsertTrip(Trip),
    /// Replace a trip. `version` must still match the stored row.
    UpdateTrip(Trip),
    /// Remove a trip read at `version`.
    DeleteTrip { id: TripId, version: u64 },
    SetEquipmentStatus(EquipmentId, EquipmentStatus),
    SetDriverStatus(DriverId, DriverStatus),
    UpdateLoadsheet(Loadsheet),
    InsertReport(DriverTripReport),
    InsertIssue(EquipmentIssue),
    /// Fails if the trip already has a rating.
    InsertMoraleRating(MoraleRating),
    /// Take a ledger hold. Fails if another trip holds the resource.
    Hold { resource: ResourceKey, trip: TripId },
    /// Drop a ledger hold if `trip` owns it.
    Release { resource: ResourceKey, trip: TripId },
    UpdateLegacyRoute(LegacyRoute),
    /// Fails on a duplicate template code.
    InsertTemplate(RouteTemplate),
}

impl Write {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Write::InsertTrip(_) => "insert_trip",
            Write::UpdateTrip(_) => "update_trip",
            Write::DeleteTrip { .. } => "delete_trip",
            Write::SetEquipmentStatus(..) => "set_equipment_status",
            Write::SetDriverStatus(..) => "set_driver_status",
            Write::UpdateLoadsheet(_) => "update_loadsheet",
            Write::InsertReport(_) => "insert_report",
            Write::InsertIssue(_) => "insert_issue",
            Write::InsertMoraleRating(_) => "insert_morale_rating",
            Write::Hold { .. } => "hold",
            Write::Release { .. } => "release",
            Write::UpdateLegacyRoute(_) => "update_legacy_route",
            Write::InsertTemplate(_) => "insert_template",
        }
    }
}

/// Ordered list of writes committed as one atomic unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    writes: Vec<Write>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) {
        self.writes.push(write);
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Comma-separated write labels, for tracing.
    pub fn summary(&self) -> String {
        self.writes
            .iter()
            .map(Write::label)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Extend<Write> for UnitOfWork {
    fn extend<I: IntoIterator<Item = Write>>(&mut self, iter: I) {
        self.writes.extend(iter);
    }
}
