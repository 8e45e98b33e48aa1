//! The trip record and its attachments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{DriverId, EquipmentId, EquipmentKind, TemplateId, TripId, TripNumber, TripStatus};

/// Which slot on a trip an equipment unit occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Truck,
    Trailer,
    Trailer2,
    Dolly,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 4] = [
        EquipmentSlot::Truck,
        EquipmentSlot::Trailer,
        EquipmentSlot::Trailer2,
        EquipmentSlot::Dolly,
    ];

    /// The kind of unit this slot accepts.
    pub fn kind(self) -> EquipmentKind {
        match self {
            EquipmentSlot::Truck => EquipmentKind::Truck,
            EquipmentSlot::Trailer | EquipmentSlot::Trailer2 => EquipmentKind::Trailer,
            EquipmentSlot::Dolly => EquipmentKind::Dolly,
        }
    }
}

/// A linehaul trip.
///
/// `version` increments on every committed update and backs the store's
/// optimistic concurrency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub number: TripNumber,
    pub template_id: TemplateId,
    pub dispatch_date: NaiveDate,
    pub planned_departure: Option<DateTime<Utc>>,
    pub planned_arrival: Option<DateTime<Utc>>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub actual_miles: Option<f64>,
    pub driver: Option<DriverId>,
    pub team_driver: Option<DriverId>,
    pub truck: Option<EquipmentId>,
    pub trailer: Option<EquipmentId>,
    pub trailer2: Option<EquipmentId>,
    pub dolly: Option<EquipmentId>,
    pub notes: Option<String>,
    pub status: TripStatus,
    pub version: u64,
}

impl Trip {
    /// The unit in `slot`, if any.
    pub fn equipment(&self, slot: EquipmentSlot) -> Option<EquipmentId> {
        match slot {
            EquipmentSlot::Truck => self.truck,
            EquipmentSlot::Trailer => self.trailer,
            EquipmentSlot::Trailer2 => self.trailer2,
            EquipmentSlot::Dolly => self.dolly,
        }
    }

    pub fn set_equipment(&mut self, slot: EquipmentSlot, unit: Option<EquipmentId>) {
        match slot {
            EquipmentSlot::Truck => self.truck = unit,
            EquipmentSlot::Trailer => self.trailer = unit,
            EquipmentSlot::Trailer2 => self.trailer2 = unit,
            EquipmentSlot::Dolly => self.dolly = unit,
        }
    }

    /// Every attached unit, truck first.
    pub fn attached_equipment(&self) -> Vec<EquipmentId> {
        EquipmentSlot::ALL
            .iter()
            .filter_map(|slot| self.equipment(*slot))
            .collect()
    }

    /// Primary then team driver, whichever are set.
    pub fn drivers(&self) -> Vec<DriverId> {
        self.driver.into_iter().chain(self.team_driver).collect()
    }

    /// Whether `driver` is the primary or team driver.
    pub fn is_crewed_by(&self, driver: DriverId) -> bool {
        self.driver == Some(driver) || self.team_driver == Some(driver)
    }

    /// Whether anything at all is attached.
    pub fn has_assignments(&self) -> bool {
        !self.drivers().is_empty() || !self.attached_equipment().is_empty()
    }

    /// Append a line to the free-text notes.
    pub fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
            _ => note.to_string(),
        });
    }
}
