//! Scenario tests for the trip lifecycle coordinator.

use super::*;
use crate::domain::{
    DriverId, DriverStatus, EquipmentId, EquipmentKind, EquipmentStatus, Loadsheet, LoadsheetId,
    TemplateCode, Trip, TripId, TripStatus,
};
use crate::store::fixtures::{
    DOLLY_1, DRIVER_A, DRIVER_B, DRIVER_C, SHEET_1, SHEET_2, SHEET_3, TRAILER_1, TRAILER_2,
    TRUCK_1, TRUCK_2, code, date, seeded_store,
};
use crate::store::{MemoryStore, ResourceKey, Store, StoreError, StoreView, UnitOfWork, Write};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 22, 5, 0).unwrap()
}

fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, day, h, m, 0).unwrap()
}

fn coordinator() -> Coordinator<MemoryStore> {
    Coordinator::new(Arc::new(seeded_store()), CoordinatorConfig::default()).with_clock(clock)
}

fn template(s: &str) -> TemplateCode {
    TemplateCode::parse(s).unwrap()
}

fn planned(c: &Coordinator<MemoryStore>) -> Trip {
    c.create_trip(&template("DENSLC1"), date(), &TripAssignments::default())
        .unwrap()
}

/// A DENSLC1 trip crewed by driver A with truck 1 and trailer 1.
fn crewed(c: &Coordinator<MemoryStore>) -> Trip {
    let assignments = TripAssignments {
        crew: Crew {
            driver: Some(DRIVER_A),
            team_driver: None,
        },
        equipment: EquipmentSet {
            truck: Some(TRUCK_1),
            trailer: Some(TRAILER_1),
            ..EquipmentSet::default()
        },
        notes: None,
    };
    c.create_trip(&template("DENSLC1"), date(), &assignments)
        .unwrap()
}

fn rolling(c: &Coordinator<MemoryStore>) -> Trip {
    let trip = crewed(c);
    c.dispatch(trip.id, DRIVER_A, None).unwrap()
}

fn driver_status(c: &Coordinator<MemoryStore>, id: DriverId) -> DriverStatus {
    c.store().read(|v| v.driver(id).unwrap().status).unwrap()
}

fn unit_status(c: &Coordinator<MemoryStore>, id: EquipmentId) -> EquipmentStatus {
    c.store().read(|v| v.equipment(id).unwrap().status).unwrap()
}

fn holder(c: &Coordinator<MemoryStore>, key: ResourceKey) -> Option<TripId> {
    c.store().read(|v| v.holder(key)).unwrap()
}

fn sheet(c: &Coordinator<MemoryStore>, id: LoadsheetId) -> Loadsheet {
    c.store().read(|v| v.loadsheet(id).unwrap().clone()).unwrap()
}

fn full_arrival() -> ArrivalDetails {
    ArrivalDetails {
        arrived_at: Some(at(2, 6, 10)),
        drop_hooks: 2,
        chain_ups: 1,
        wait_start: Some(at(2, 6, 15)),
        wait_end: Some(at(2, 7, 0)),
        wait_reason: Some("dock full".into()),
        notes: Some("icy on I-80".into()),
        issue: Some(IssueReport {
            kind: Some(EquipmentKind::Trailer),
            unit_number: Some("28-2001".into()),
            description: Some("marker light out".into()),
        }),
        morale: Some(4),
        ..ArrivalDetails::default()
    }
}

// ---- create ----

#[test]
fn create_numbers_trips_per_template_and_day() {
    let c = coordinator();
    let first = planned(&c);
    let second = planned(&c);
    assert_eq!(first.number.as_str(), "DENSLC1-20250401-001");
    assert_eq!(second.number.as_str(), "DENSLC1-20250401-002");
    assert_eq!(first.status, TripStatus::Planned);

    let next_day = c
        .create_trip(
            &template("DENSLC1"),
            date().succ_opt().unwrap(),
            &TripAssignments::default(),
        )
        .unwrap();
    assert_eq!(next_day.number.as_str(), "DENSLC1-20250402-001");

    let other = c
        .create_trip(&template("PHXABQ1"), date(), &TripAssignments::default())
        .unwrap();
    assert_eq!(other.number.as_str(), "PHXABQ1-20250401-001");
}

#[test]
fn create_takes_planned_times_from_template() {
    let c = coordinator();
    let trip = planned(&c);
    assert_eq!(trip.planned_departure, Some(at(1, 22, 0)));
    assert_eq!(trip.planned_arrival, Some(at(2, 6, 0)));

    let phx = c
        .create_trip(&template("PHXABQ1"), date(), &TripAssignments::default())
        .unwrap();
    assert_eq!(phx.planned_departure, Some(at(1, 19, 30)));
    assert_eq!(phx.planned_arrival, Some(at(2, 2, 30)));
}

#[test]
fn create_with_assignments_holds_resources() {
    let c = coordinator();
    let trip = crewed(&c);
    assert_eq!(trip.status, TripStatus::Assigned);
    assert_eq!(trip.driver, Some(DRIVER_A));
    assert_eq!(holder(&c, ResourceKey::Driver(DRIVER_A)), Some(trip.id));
    assert_eq!(holder(&c, ResourceKey::Equipment(TRUCK_1)), Some(trip.id));
    assert_eq!(holder(&c, ResourceKey::Equipment(TRAILER_1)), Some(trip.id));
    // Assignment alone does not change availability.
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::Available);
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::Available);
}

#[test]
fn create_rejections() {
    let c = coordinator();

    let err = c
        .create_trip(&template("NOPE1"), date(), &TripAssignments::default())
        .unwrap_err();
    assert_eq!(err, LifecycleError::TemplateNotFound(template("NOPE1")));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = c
        .create_trip(&template("SLCPHX9"), date(), &TripAssignments::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let ghost = TripAssignments {
        crew: Crew {
            driver: Some(DriverId(99)),
            team_driver: None,
        },
        ..TripAssignments::default()
    };
    let err = c.create_trip(&template("DENSLC1"), date(), &ghost).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    // Nothing was inserted by the failures.
    let first = planned(&c);
    assert_eq!(first.number.as_str(), "DENSLC1-20250401-001");
}

#[test]
fn create_rejects_resources_held_elsewhere() {
    let c = coordinator();
    let first = crewed(&c);
    let assignments = TripAssignments {
        equipment: EquipmentSet {
            truck: Some(TRUCK_1),
            ..EquipmentSet::default()
        },
        ..TripAssignments::default()
    };
    let err = c
        .create_trip(&template("DENSLC1"), date(), &assignments)
        .unwrap_err();
    assert_eq!(
        err,
        LifecycleError::ResourceBusy {
            resource: ResourceKey::Equipment(TRUCK_1),
            holder: first.id
        }
    );
}

#[test]
fn concurrent_creates_get_distinct_numbers() {
    const THREADS: usize = 8;
    let store = Arc::new(seeded_store());
    let c = Arc::new(Coordinator::new(
        store,
        CoordinatorConfig::new(THREADS as u32),
    ));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let c = Arc::clone(&c);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                c.create_trip(&template("DENSLC1"), date(), &TripAssignments::default())
            })
        })
        .collect();

    let numbers: BTreeSet<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().number.as_str().to_string())
        .collect();
    assert_eq!(numbers.len(), THREADS);

    let expected: BTreeSet<String> = (1..=THREADS)
        .map(|seq| format!("DENSLC1-20250401-{seq:03}"))
        .collect();
    assert_eq!(numbers, expected);
}

/// A store on which every trip insert loses the race for its number.
struct AlwaysTaken {
    inner: MemoryStore,
    attempts: AtomicUsize,
}

impl Store for AlwaysTaken {
    fn read<T>(&self, f: impl FnOnce(&dyn StoreView) -> T) -> Result<T, StoreError> {
        self.inner.read(f)
    }

    fn transaction<T, E>(
        &self,
        f: impl FnOnce(&dyn StoreView) -> Result<(T, UnitOfWork), E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let (_, work) = self.inner.read(f)??;
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let number = work.writes().iter().find_map(|w| match w {
            Write::InsertTrip(trip) => Some(trip.number.clone()),
            _ => None,
        });
        Err(E::from(match number {
            Some(number) => StoreError::DuplicateTripNumber(number),
            None => StoreError::Poisoned,
        }))
    }
}

#[test]
fn allocation_gives_up_after_budget() {
    let store = Arc::new(AlwaysTaken {
        inner: seeded_store(),
        attempts: AtomicUsize::new(0),
    });
    let c = Coordinator::new(Arc::clone(&store), CoordinatorConfig::new(3));
    let err = c
        .create_trip(&template("DENSLC1"), date(), &TripAssignments::default())
        .unwrap_err();
    assert_eq!(
        err,
        LifecycleError::TripNumberConflict {
            prefix: "DENSLC1-20250401-".to_string(),
            attempts: 3
        }
    );
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn other_errors_are_not_retried() {
    let store = Arc::new(AlwaysTaken {
        inner: seeded_store(),
        attempts: AtomicUsize::new(0),
    });
    let c = Coordinator::new(Arc::clone(&store), CoordinatorConfig::new(3));
    let err = c
        .create_trip(&template("NOPE1"), date(), &TripAssignments::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(store.attempts.load(Ordering::SeqCst), 0);
}

// ---- assignment ----

#[test]
fn assigning_a_driver_advances_planned_trip() {
    let c = coordinator();
    let trip = planned(&c);
    let updated = c.assign_driver(trip.id, DRIVER_A, Some(DRIVER_B)).unwrap();
    assert_eq!(updated.status, TripStatus::Assigned);
    assert_eq!(updated.driver, Some(DRIVER_A));
    assert_eq!(updated.team_driver, Some(DRIVER_B));
    assert_eq!(updated.version, trip.version + 1);
    assert_eq!(c.trip(trip.id).unwrap(), updated);
}

#[test]
fn assignment_errors() {
    let c = coordinator();
    let trip = planned(&c);

    assert_eq!(
        c.assign_driver(TripId(999), DRIVER_A, None).unwrap_err(),
        LifecycleError::TripNotFound(TripId(999))
    );
    assert_eq!(
        c.assign_driver(trip.id, DriverId(77), None)
            .unwrap_err(),
        LifecycleError::DriverNotFound(DriverId(77))
    );

    let err = c
        .assign_equipment(
            trip.id,
            EquipmentSet {
                truck: Some(EquipmentId(404)),
                ..EquipmentSet::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let err = c
        .assign_equipment(
            trip.id,
            EquipmentSet {
                truck: Some(TRAILER_2),
                ..EquipmentSet::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    assert_eq!(c.trip(trip.id).unwrap(), trip);
}

#[test]
fn double_booking_is_rejected() {
    let c = coordinator();
    let first = crewed(&c);
    let second = planned(&c);

    let err = c
        .assign_equipment(
            second.id,
            EquipmentSet {
                truck: Some(TRUCK_1),
                ..EquipmentSet::default()
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        LifecycleError::ResourceBusy {
            resource: ResourceKey::Equipment(TRUCK_1),
            holder: first.id
        }
    );
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = c.assign_driver(second.id, DRIVER_A, None).unwrap_err();
    assert!(matches!(err, LifecycleError::ResourceBusy { .. }));
    assert_eq!(c.trip(second.id).unwrap().status, TripStatus::Planned);

    // Once the first trip lets go, the second can have them.
    c.cancel(first.id, None).unwrap();
    let taken = c.assign_driver(second.id, DRIVER_A, None).unwrap();
    assert_eq!(taken.driver, Some(DRIVER_A));
    assert_eq!(holder(&c, ResourceKey::Driver(DRIVER_A)), Some(second.id));
}

#[test]
fn reassignment_moves_holds() {
    let c = coordinator();
    let trip = crewed(&c);
    let updated = c
        .assign_equipment(
            trip.id,
            EquipmentSet {
                truck: Some(TRUCK_2),
                trailer: Some(TRAILER_1),
                trailer2: Some(TRAILER_2),
                dolly: Some(DOLLY_1),
            },
        )
        .unwrap();
    assert_eq!(
        updated.attached_equipment(),
        vec![TRUCK_2, TRAILER_1, TRAILER_2, DOLLY_1]
    );
    assert_eq!(holder(&c, ResourceKey::Equipment(TRUCK_1)), None);
    assert_eq!(holder(&c, ResourceKey::Equipment(TRUCK_2)), Some(trip.id));
    assert_eq!(holder(&c, ResourceKey::Equipment(DOLLY_1)), Some(trip.id));

    let crew = c.assign_driver(trip.id, DRIVER_C, None).unwrap();
    assert_eq!(crew.driver, Some(DRIVER_C));
    assert_eq!(holder(&c, ResourceKey::Driver(DRIVER_A)), None);
}

#[test]
fn swapping_units_on_a_rolling_trip_updates_status() {
    let c = coordinator();
    let trip = rolling(&c);
    c.assign_equipment(
        trip.id,
        EquipmentSet {
            truck: Some(TRUCK_2),
            trailer: Some(TRAILER_1),
            ..EquipmentSet::default()
        },
    )
    .unwrap();
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::Available);
    assert_eq!(unit_status(&c, TRUCK_2), EquipmentStatus::InTransit);
}

#[test]
fn swapping_units_keeps_linked_loadsheets() {
    let c = coordinator();
    let trip = crewed(&c);
    c.link_loadsheet(trip.id, SHEET_1).unwrap();
    c.update_status(trip.id, TripStatus::Dispatched).unwrap();

    c.assign_equipment(
        trip.id,
        EquipmentSet {
            truck: Some(TRUCK_2),
            trailer: Some(TRAILER_1),
            ..EquipmentSet::default()
        },
    )
    .unwrap();
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::Available);
    assert_eq!(unit_status(&c, TRUCK_2), EquipmentStatus::Dispatched);
    assert_eq!(holder(&c, ResourceKey::Loadsheet(SHEET_1)), Some(trip.id));
    assert_eq!(sheet(&c, SHEET_1).trip_id, Some(trip.id));
}

#[test]
fn finished_trips_cannot_be_reassigned() {
    let c = coordinator();
    let trip = planned(&c);
    c.cancel(trip.id, None).unwrap();
    let err = c.assign_driver(trip.id, DRIVER_A, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

// ---- dispatch ----

#[test]
fn dispatch_puts_everything_on_the_road() {
    let c = coordinator();
    let trip = crewed(&c);
    c.assign_driver(trip.id, DRIVER_A, Some(DRIVER_B)).unwrap();
    c.assign_equipment(
        trip.id,
        EquipmentSet {
            truck: Some(TRUCK_1),
            trailer: Some(TRAILER_1),
            trailer2: Some(TRAILER_2),
            dolly: Some(DOLLY_1),
        },
    )
    .unwrap();

    // The team driver may dispatch too.
    let rolling = c.dispatch(trip.id, DRIVER_B, Some("fuelled at yard")).unwrap();
    assert_eq!(rolling.status, TripStatus::InTransit);
    assert_eq!(rolling.actual_departure, Some(clock()));
    assert_eq!(rolling.notes.as_deref(), Some("fuelled at yard"));

    for unit in [TRUCK_1, TRAILER_1, TRAILER_2, DOLLY_1] {
        assert_eq!(unit_status(&c, unit), EquipmentStatus::InTransit);
    }
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::Driving);
    assert_eq!(driver_status(&c, DRIVER_B), DriverStatus::OnDuty);
    assert_eq!(unit_status(&c, TRUCK_2), EquipmentStatus::Available);
}

#[test]
fn dispatch_by_someone_else_is_unauthorized() {
    let c = coordinator();
    let trip = crewed(&c);
    let err = c.dispatch(trip.id, DRIVER_C, None).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::NotAssignedToTrip {
            trip: trip.number.clone(),
            driver: DRIVER_C
        }
    );
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(c.trip(trip.id).unwrap(), trip);
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::Available);
}

#[test]
fn dispatch_requires_assigned_or_dispatched() {
    let c = coordinator();
    let trip = planned(&c);
    let err = c.dispatch(trip.id, DRIVER_A, None).unwrap_err();
    // Nobody is crewed yet, so authorization fails first.
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let rolling = rolling(&c);
    let err = c.dispatch(rolling.id, DRIVER_A, None).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidState {
            status: TripStatus::InTransit,
            ..
        }
    ));
}

#[test]
fn authorization_is_checked_before_state() {
    let c = coordinator();
    let trip = crewed(&c);

    // Wrong driver and wrong state: arriving a trip that has not left.
    let err = c
        .arrive(trip.id, DRIVER_C, &ArrivalDetails::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    c.dispatch(trip.id, DRIVER_A, None).unwrap();
    // Wrong driver and wrong state: dispatching a trip already rolling.
    let err = c.dispatch(trip.id, DRIVER_C, None).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::NotAssignedToTrip {
            trip: trip.number.clone(),
            driver: DRIVER_C
        }
    );

    // The crewed driver sees the state problem.
    let err = c.dispatch(trip.id, DRIVER_A, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn dispatch_from_dispatched() {
    let c = coordinator();
    let trip = crewed(&c);
    let staged = c.update_status(trip.id, TripStatus::Dispatched).unwrap();
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::Dispatched);
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::OnDuty);

    let rolling = c.dispatch(staged.id, DRIVER_A, None).unwrap();
    assert_eq!(rolling.status, TripStatus::InTransit);
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::Driving);
}

#[test]
fn dispatch_is_all_or_nothing() {
    let c = coordinator();
    let trip = crewed(&c);
    let before = c.store().snapshot().unwrap();

    // trip update, truck, trailer, driver
    for fault in 0..4 {
        c.store().inject_fault(fault);
        let err = c.dispatch(trip.id, DRIVER_A, None).unwrap_err();
        assert_eq!(err, LifecycleError::Storage(StoreError::InjectedFault(fault)));
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(c.store().snapshot().unwrap(), before);
    }

    let rolling = c.dispatch(trip.id, DRIVER_A, None).unwrap();
    assert_eq!(rolling.status, TripStatus::InTransit);
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::InTransit);
    assert_eq!(unit_status(&c, TRAILER_1), EquipmentStatus::InTransit);
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::Driving);
}

#[test]
fn concurrent_dispatch_has_one_winner() {
    let c = Arc::new(coordinator());
    let trip = crewed(&c);
    let id = trip.id;
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let c = Arc::clone(&c);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                c.dispatch(id, DRIVER_A, None)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        // Either saw the winner's write or lost the commit race.
        assert!(matches!(
            result.kind(),
            ErrorKind::InvalidState | ErrorKind::Conflict
        ));
    }
    assert_eq!(c.trip(trip.id).unwrap().version, trip.version + 1);
}

// ---- arrival ----

#[test]
fn arrive_releases_and_records() {
    let c = coordinator();
    let trip = crewed(&c);
    c.link_loadsheet(trip.id, SHEET_1).unwrap();
    c.link_loadsheet(trip.id, SHEET_2).unwrap();
    c.dispatch(trip.id, DRIVER_A, None).unwrap();

    let outcome = c.arrive(trip.id, DRIVER_A, &full_arrival()).unwrap();
    assert_eq!(outcome.trip.status, TripStatus::Arrived);
    assert_eq!(outcome.trip.actual_arrival, Some(at(2, 6, 10)));
    assert_eq!(outcome.trip.actual_miles, Some(370.0));

    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::Available);
    assert_eq!(unit_status(&c, TRAILER_1), EquipmentStatus::Available);
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::Available);
    assert_eq!(holder(&c, ResourceKey::Driver(DRIVER_A)), None);
    assert_eq!(holder(&c, ResourceKey::Equipment(TRUCK_1)), None);
    assert_eq!(holder(&c, ResourceKey::Loadsheet(SHEET_1)), None);

    for id in [SHEET_1, SHEET_2] {
        let sheet = sheet(&c, id);
        assert_eq!(sheet.trip_id, None);
        assert_eq!(sheet.origin, code("SLC"));
    }
    assert_eq!(outcome.released.len(), 2);
    // Unrelated manifests stay put.
    assert_eq!(sheet(&c, SHEET_3).origin, code("PHX"));

    assert_eq!(outcome.report.drop_hooks, 2);
    assert_eq!(outcome.report.chain_ups, 1);
    assert_eq!(outcome.report.wait_minutes, Some(45));
    assert_eq!(outcome.report.driver_id, DRIVER_A);

    let issue = outcome.issue.unwrap();
    assert_eq!(issue.unit_number, "28-2001");
    assert_eq!(issue.kind, EquipmentKind::Trailer);
    assert_eq!(outcome.morale.unwrap().rating, 4);

    let detail = c.trip_detail(trip.id).unwrap();
    assert_eq!(detail.reports.len(), 1);
    assert_eq!(detail.issues.len(), 1);
    assert!(detail.loadsheets.is_empty());
}

#[test]
fn arrive_defaults() {
    let c = coordinator();
    let trip = rolling(&c);
    let details = ArrivalDetails {
        issue: Some(IssueReport {
            kind: Some(EquipmentKind::Truck),
            unit_number: Some("T-510".into()),
            description: None,
        }),
        ..ArrivalDetails::default()
    };
    let outcome = c.arrive(trip.id, DRIVER_A, &details).unwrap();
    assert_eq!(outcome.trip.actual_arrival, Some(clock()));
    assert_eq!(outcome.report.wait_minutes, None);
    assert_eq!(outcome.issue, None);
    assert_eq!(outcome.morale, None);
}

#[test]
fn arriving_twice_is_rejected() {
    let c = coordinator();
    let trip = crewed(&c);
    c.link_loadsheet(trip.id, SHEET_1).unwrap();
    c.dispatch(trip.id, DRIVER_A, None).unwrap();
    c.arrive(trip.id, DRIVER_A, &full_arrival()).unwrap();
    let after_first = c.store().snapshot().unwrap();

    let err = c.arrive(trip.id, DRIVER_A, &full_arrival()).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::InvalidState {
            trip: trip.number.clone(),
            operation: "arrive",
            status: TripStatus::Arrived,
            expected: "IN_TRANSIT",
        }
    );
    assert_eq!(c.store().snapshot().unwrap(), after_first);

    let detail = c.trip_detail(trip.id).unwrap();
    assert_eq!(detail.reports.len(), 1);
    assert!(detail.morale.is_some());
}

#[test]
fn arriving_again_with_bad_details_is_still_invalid_state() {
    let c = coordinator();
    let trip = rolling(&c);
    c.arrive(trip.id, DRIVER_A, &full_arrival()).unwrap();
    let after_first = c.store().snapshot().unwrap();

    let bad = ArrivalDetails {
        morale: Some(9),
        ..ArrivalDetails::default()
    };
    let err = c.arrive(trip.id, DRIVER_A, &bad).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidState {
            operation: "arrive",
            status: TripStatus::Arrived,
            ..
        }
    ));
    assert_eq!(c.store().snapshot().unwrap(), after_first);
}

#[test]
fn arrive_needs_crew_and_valid_details() {
    let c = coordinator();
    let trip = rolling(&c);

    let err = c
        .arrive(trip.id, DRIVER_B, &ArrivalDetails::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let bad = ArrivalDetails {
        morale: Some(0),
        ..ArrivalDetails::default()
    };
    let err = c.arrive(trip.id, DRIVER_A, &bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(c.trip(trip.id).unwrap().status, TripStatus::InTransit);
}

#[test]
fn arrive_before_dispatch_fails() {
    let c = coordinator();
    let trip = crewed(&c);
    let before = c.store().snapshot().unwrap();
    let err = c
        .arrive(trip.id, DRIVER_A, &ArrivalDetails::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(c.store().snapshot().unwrap(), before);
}

#[test]
fn morale_rating_is_idempotent() {
    let c = coordinator();
    let trip = rolling(&c);
    let outcome = c
        .arrive(
            trip.id,
            DRIVER_A,
            &ArrivalDetails {
                morale: Some(3),
                ..ArrivalDetails::default()
            },
        )
        .unwrap();
    let original = outcome.morale.unwrap();

    let again = c.rate_trip(trip.id, DRIVER_A, 5).unwrap();
    assert_eq!(again, original);

    let other = rolling(&c);
    c.arrive(other.id, DRIVER_A, &ArrivalDetails::default()).unwrap();
    let first = c.rate_trip(other.id, DRIVER_A, 5).unwrap();
    let second = c.rate_trip(other.id, DRIVER_A, 2).unwrap();
    assert_eq!(first.rating, 5);
    assert_eq!(second, first);

    assert_eq!(
        c.rate_trip(other.id, DRIVER_A, 6).unwrap_err().kind(),
        ErrorKind::ValidationFailed
    );
}

#[test]
fn rating_requires_finished_trip() {
    let c = coordinator();
    let trip = rolling(&c);
    let err = c.rate_trip(trip.id, DRIVER_A, 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = c.rate_trip(trip.id, DRIVER_A, 9).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

// ---- cancel, complete, administrative updates ----

#[test]
fn cancel_frees_everything() {
    let c = coordinator();
    let trip = crewed(&c);
    c.link_loadsheet(trip.id, SHEET_1).unwrap();
    c.dispatch(trip.id, DRIVER_A, None).unwrap();

    let cancelled = c.cancel(trip.id, Some("blizzard on Soldier Summit")).unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);
    assert_eq!(
        cancelled.notes.as_deref(),
        Some("Cancelled: blizzard on Soldier Summit")
    );
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::Available);
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::Available);
    assert_eq!(holder(&c, ResourceKey::Equipment(TRUCK_1)), None);

    // Unlinked, but the freight never left.
    let sheet = sheet(&c, SHEET_1);
    assert_eq!(sheet.trip_id, None);
    assert_eq!(sheet.origin, code("DEN"));

    let err = c.cancel(trip.id, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn complete_only_after_arrival() {
    let c = coordinator();
    let trip = rolling(&c);
    assert_eq!(c.complete(trip.id).unwrap_err().kind(), ErrorKind::InvalidState);
    c.arrive(trip.id, DRIVER_A, &ArrivalDetails::default()).unwrap();
    let done = c.complete(trip.id).unwrap();
    assert_eq!(done.status, TripStatus::Completed);
    assert_eq!(c.cancel(trip.id, None).unwrap_err().kind(), ErrorKind::InvalidState);
}

#[test]
fn admin_update_follows_edges() {
    let c = coordinator();
    let trip = planned(&c);
    let err = c.update_status(trip.id, TripStatus::InTransit).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::ForbiddenTransition {
            trip: trip.number.clone(),
            from: TripStatus::Planned,
            to: TripStatus::InTransit,
        }
    );
    let assigned = c.update_status(trip.id, TripStatus::Assigned).unwrap();
    assert_eq!(assigned.status, TripStatus::Assigned);
}

#[test]
fn admin_arrival_releases_holds_but_files_nothing() {
    let c = coordinator();
    let trip = crewed(&c);
    c.link_loadsheet(trip.id, SHEET_1).unwrap();
    c.update_status(trip.id, TripStatus::InTransit).unwrap();
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::InTransit);
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::Driving);

    let arrived = c.update_status(trip.id, TripStatus::Arrived).unwrap();
    assert_eq!(arrived.actual_arrival, Some(clock()));
    assert_eq!(unit_status(&c, TRUCK_1), EquipmentStatus::Available);
    assert_eq!(driver_status(&c, DRIVER_A), DriverStatus::Available);
    assert_eq!(holder(&c, ResourceKey::Equipment(TRUCK_1)), None);

    let detail = c.trip_detail(trip.id).unwrap();
    assert!(detail.reports.is_empty());
    assert!(detail.loadsheets.is_empty());
    assert_eq!(holder(&c, ResourceKey::Loadsheet(SHEET_1)), None);
    assert_eq!(sheet(&c, SHEET_1).origin, code("SLC"));
}

#[test]
fn admin_cancel_frees_loadsheets() {
    let c = coordinator();
    let trip = crewed(&c);
    let origin = sheet(&c, SHEET_1).origin;
    c.link_loadsheet(trip.id, SHEET_1).unwrap();

    c.update_status(trip.id, TripStatus::Cancelled).unwrap();
    let freed = sheet(&c, SHEET_1);
    assert_eq!(freed.trip_id, None);
    assert_eq!(freed.origin, origin);
    assert_eq!(holder(&c, ResourceKey::Loadsheet(SHEET_1)), None);

    let other = planned(&c);
    assert_eq!(
        c.link_loadsheet(other.id, SHEET_1).unwrap().trip_id,
        Some(other.id)
    );
    c.delete_trip(trip.id).unwrap();
}

// ---- loadsheets and deletion ----

#[test]
fn loadsheet_linking() {
    let c = coordinator();
    let first = planned(&c);
    let second = planned(&c);

    let linked = c.link_loadsheet(first.id, SHEET_1).unwrap();
    assert_eq!(linked.trip_id, Some(first.id));
    // Linking again to the same trip is harmless.
    assert_eq!(c.link_loadsheet(first.id, SHEET_1).unwrap(), linked);

    assert_eq!(
        c.link_loadsheet(second.id, SHEET_1).unwrap_err(),
        LifecycleError::LoadsheetLinked {
            loadsheet: SHEET_1,
            trip: first.id
        }
    );
    assert_eq!(
        c.link_loadsheet(second.id, LoadsheetId(9)).unwrap_err(),
        LifecycleError::LoadsheetNotFound(LoadsheetId(9))
    );
}

#[test]
fn delete_rules() {
    let c = coordinator();

    let fresh = planned(&c);
    assert_eq!(c.delete_trip(fresh.id).unwrap(), fresh.number);
    assert_eq!(c.trip(fresh.id).unwrap_err().kind(), ErrorKind::NotFound);

    let cancelled = crewed(&c);
    c.cancel(cancelled.id, None).unwrap();
    c.delete_trip(cancelled.id).unwrap();

    let rolling = rolling(&c);
    let err = c.delete_trip(rolling.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let staged = planned(&c);
    c.link_loadsheet(staged.id, SHEET_2).unwrap();
    let err = c.delete_trip(staged.id).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::HasDependents {
            trip: staged.number.clone(),
            count: 1
        }
    );
}

#[test]
fn deleting_dispatched_trip_fails() {
    let c = coordinator();
    let trip = crewed(&c);
    c.update_status(trip.id, TripStatus::Dispatched).unwrap();
    assert_eq!(c.delete_trip(trip.id).unwrap_err().kind(), ErrorKind::InvalidState);
    assert!(c.trip(trip.id).is_ok());
}

#[test]
fn deleted_numbers_are_reused_only_when_highest() {
    let c = coordinator();
    let first = planned(&c);
    let second = planned(&c);
    c.delete_trip(second.id).unwrap();
    let third = planned(&c);
    assert_eq!(third.number, second.number);
    assert_ne!(third.id, second.id);
    assert_eq!(first.number.sequence(), 1);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Assign,
        Dispatch,
        Arrive,
        Cancel,
        Complete,
        Admin(TripStatus),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Assign),
            Just(Op::Dispatch),
            Just(Op::Arrive),
            Just(Op::Cancel),
            Just(Op::Complete),
            proptest::sample::select(TripStatus::ALL.to_vec()).prop_map(Op::Admin),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Whatever is thrown at a trip, its status only moves along
        /// permitted edges, and a rejected call changes nothing.
        #[test]
        fn status_moves_along_permitted_edges(ops in proptest::collection::vec(op(), 1..12)) {
            let c = coordinator();
            let trip = planned(&c);

            for op in ops {
                let before = c.store().snapshot().unwrap();
                let from = c.trip(trip.id).unwrap().status;
                let result = match &op {
                    Op::Assign => c.assign_driver(trip.id, DRIVER_A, None).map(|_| ()),
                    Op::Dispatch => c.dispatch(trip.id, DRIVER_A, None).map(|_| ()),
                    Op::Arrive => c
                        .arrive(trip.id, DRIVER_A, &ArrivalDetails::default())
                        .map(|_| ()),
                    Op::Cancel => c.cancel(trip.id, None).map(|_| ()),
                    Op::Complete => c.complete(trip.id).map(|_| ()),
                    Op::Admin(target) => c.update_status(trip.id, *target).map(|_| ()),
                };
                let to = c.trip(trip.id).unwrap().status;

                match result {
                    Ok(()) => prop_assert!(from == to || from.can_transition_to(to)),
                    Err(_) => prop_assert_eq!(c.store().snapshot().unwrap(), before),
                }
                if matches!(op, Op::Arrive) && from != TripStatus::InTransit {
                    prop_assert_eq!(to, from);
                }
            }

            let detail = c.trip_detail(trip.id).unwrap();
            prop_assert!(detail.reports.len() <= 1);
        }
    }
}
