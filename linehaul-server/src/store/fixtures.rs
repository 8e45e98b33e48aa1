//! Shared test data: a small network around Denver, Salt Lake City and
//! Phoenix with a handful of drivers, units and manifests.

use chrono::NaiveDate;

use crate::domain::{
    Driver, DriverId, DriverStatus, Equipment, EquipmentId, EquipmentKind, EquipmentStatus,
    Loadsheet, LoadsheetId, MileageEntry, RouteTemplate, TemplateCode, TemplateId, Terminal,
    TerminalCode, TimeOfDay, Trip, TripId, TripNumber, TripStatus,
};

use super::{MemoryStore, Snapshot};

pub const DENSLC: TemplateId = TemplateId(1);
pub const PHXABQ: TemplateId = TemplateId(2);
pub const RETIRED: TemplateId = TemplateId(3);

pub const DRIVER_A: DriverId = DriverId(1);
pub const DRIVER_B: DriverId = DriverId(2);
pub const DRIVER_C: DriverId = DriverId(3);

pub const TRUCK_1: EquipmentId = EquipmentId(10);
pub const TRUCK_2: EquipmentId = EquipmentId(11);
pub const TRAILER_1: EquipmentId = EquipmentId(20);
pub const TRAILER_2: EquipmentId = EquipmentId(21);
pub const TRAILER_3: EquipmentId = EquipmentId(22);
pub const DOLLY_1: EquipmentId = EquipmentId(30);

pub const SHEET_1: LoadsheetId = LoadsheetId(40);
pub const SHEET_2: LoadsheetId = LoadsheetId(41);
pub const SHEET_3: LoadsheetId = LoadsheetId(42);

pub fn code(s: &str) -> TerminalCode {
    TerminalCode::parse(s).unwrap()
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
}

fn terminal(c: &str, name: &str, coords: Option<(f64, f64)>) -> Terminal {
    Terminal {
        code: code(c),
        name: name.to_string(),
        latitude: coords.map(|c| c.0),
        longitude: coords.map(|c| c.1),
    }
}

fn unit(id: EquipmentId, kind: EquipmentKind, number: &str) -> Equipment {
    Equipment {
        id,
        kind,
        unit_number: number.to_string(),
        status: EquipmentStatus::Available,
    }
}

fn driver(id: DriverId, number: &str, name: &str) -> Driver {
    Driver {
        id,
        number: number.to_string(),
        name: name.to_string(),
        status: DriverStatus::Available,
    }
}

fn sheet(id: LoadsheetId, manifest: &str, origin: &str) -> Loadsheet {
    Loadsheet {
        id,
        manifest_number: manifest.to_string(),
        origin: code(origin),
        trailer_number: None,
        trip_id: None,
    }
}

pub fn seeded_snapshot() -> Snapshot {
    Snapshot {
        terminals: vec![
            terminal("DEN", "Denver", Some((39.7392, -104.9903))),
            terminal("SLC", "Salt Lake City", Some((40.7608, -111.8910))),
            terminal("PHX", "Phoenix", Some((33.4484, -112.0740))),
            terminal("ABQ", "Albuquerque", None),
        ],
        templates: vec![
            RouteTemplate {
                id: DENSLC,
                code: TemplateCode::parse("DENSLC1").unwrap(),
                origin: code("DEN"),
                destination: code("SLC"),
                departure: Some(TimeOfDay::parse("22:00").unwrap()),
                arrival: Some(TimeOfDay::parse("06:00").unwrap()),
                distance_miles: Some(370.0),
                transit_minutes: None,
                active: true,
            },
            RouteTemplate {
                id: PHXABQ,
                code: TemplateCode::parse("PHXABQ1").unwrap(),
                origin: code("PHX"),
                destination: code("ABQ"),
                departure: Some(TimeOfDay::parse("19:30").unwrap()),
                arrival: None,
                distance_miles: None,
                transit_minutes: Some(420),
                active: true,
            },
            RouteTemplate {
                id: RETIRED,
                code: TemplateCode::parse("SLCPHX9").unwrap(),
                origin: code("SLC"),
                destination: code("PHX"),
                departure: None,
                arrival: None,
                distance_miles: Some(650.0),
                transit_minutes: None,
                active: false,
            },
        ],
        mileage: vec![MileageEntry {
            origin: code("PHX"),
            destination: code("ABQ"),
            miles: 421.0,
            active: true,
        }],
        drivers: vec![
            driver(DRIVER_A, "D-100", "R. Ortega"),
            driver(DRIVER_B, "D-101", "J. Whitfield"),
            driver(DRIVER_C, "D-102", "K. Nakamura"),
        ],
        equipment: vec![
            unit(TRUCK_1, EquipmentKind::Truck, "T-510"),
            unit(TRUCK_2, EquipmentKind::Truck, "T-511"),
            unit(TRAILER_1, EquipmentKind::Trailer, "28-2001"),
            unit(TRAILER_2, EquipmentKind::Trailer, "28-2002"),
            unit(TRAILER_3, EquipmentKind::Trailer, "28-2003"),
            unit(DOLLY_1, EquipmentKind::Dolly, "DL-7"),
        ],
        loadsheets: vec![
            sheet(SHEET_1, "M-9001", "DEN"),
            sheet(SHEET_2, "M-9002", "DEN"),
            sheet(SHEET_3, "M-9003", "PHX"),
        ],
        ..Snapshot::default()
    }
}

pub fn seeded_store() -> MemoryStore {
    MemoryStore::from_snapshot(seeded_snapshot()).unwrap()
}

/// A planned DENSLC1 trip with sequence `seq` on [`date`].
pub fn trip_on(id: TripId, seq: u32) -> Trip {
    Trip {
        id,
        number: TripNumber::new(&TemplateCode::parse("DENSLC1").unwrap(), date(), seq),
        template_id: DENSLC,
        dispatch_date: date(),
        planned_departure: None,
        planned_arrival: None,
        actual_departure: None,
        actual_arrival: None,
        actual_miles: None,
        driver: None,
        team_driver: None,
        truck: None,
        trailer: None,
        trailer2: None,
        dolly: None,
        notes: None,
        status: TripStatus::Planned,
        version: 0,
    }
}
