//! Resource ledger keys.
//!
//! The ledger maps each held driver, equipment unit or loadsheet to the one
//! trip that holds it. Rows are only ever written through a [`super::UnitOfWork`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{DriverId, EquipmentId, LoadsheetId, TripId};

/// Something that at most one trip can hold at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ResourceKey {
    Driver(DriverId),
    Equipment(EquipmentId),
    Loadsheet(LoadsheetId),
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::Driver(id) => write!(f, "driver {id}"),
            ResourceKey::Equipment(id) => write!(f, "equipment unit {id}"),
            ResourceKey::Loadsheet(id) => write!(f, "loadsheet {id}"),
        }
    }
}

/// One ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub resource: ResourceKey,
    pub trip: TripId,
}
