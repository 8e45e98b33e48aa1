//! Drivers and equipment units.

use serde::{Deserialize, Serialize};

use super::{DriverId, DriverStatus, EquipmentId, EquipmentKind, EquipmentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    /// Employee driver number.
    pub number: String,
    pub name: String,
    pub status: DriverStatus,
}

/// A truck, trailer or dolly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub kind: EquipmentKind,
    pub unit_number: String,
    pub status: EquipmentStatus,
}
