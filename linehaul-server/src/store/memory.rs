//! In-process transactional store.
//!
//! Transactions read under a shared lock, so concurrent transactions can
//! observe the same state. Commits take the exclusive lock and re-validate
//! everything that could have changed in between: trip row versions, the
//! trip-number unique index, the one-rating-per-trip rule and ledger holds.
//! Writes are applied to a staged copy of the tables that only replaces the
//! live tables once every write has succeeded.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;

use tracing::{debug, trace};

use crate::domain::{
    Driver, DriverId, DriverTripReport, Equipment, EquipmentId, EquipmentIssue, IssueId,
    LegacyRoute, LegacyRouteId, Loadsheet, LoadsheetId, MileageEntry, MoraleRating, RatingId,
    ReportId, RouteTemplate, TemplateCode, TemplateId, Terminal, TerminalCode, Trip, TripId,
    TripNumber,
};

use super::snapshot::{Snapshot, SnapshotError};
use super::view::{Sequence, Store, StoreView};
use super::{Hold, ResourceKey, StoreError, UnitOfWork, Write};

const NO_FAULT: usize = usize::MAX;

#[derive(Debug, Clone, Default)]
struct Tables {
    terminals: BTreeMap<TerminalCode, Terminal>,
    templates: BTreeMap<TemplateId, RouteTemplate>,
    mileage: BTreeMap<(TerminalCode, TerminalCode), MileageEntry>,
    drivers: BTreeMap<DriverId, Driver>,
    equipment: BTreeMap<EquipmentId, Equipment>,
    trips: BTreeMap<TripId, Trip>,
    /// Unique index over trip numbers.
    trip_numbers: BTreeMap<TripNumber, TripId>,
    loadsheets: BTreeMap<LoadsheetId, Loadsheet>,
    reports: BTreeMap<ReportId, DriverTripReport>,
    issues: BTreeMap<IssueId, EquipmentIssue>,
    ratings: BTreeMap<RatingId, MoraleRating>,
    ledger: BTreeMap<ResourceKey, TripId>,
    legacy_routes: BTreeMap<LegacyRouteId, LegacyRoute>,
}

impl Tables {
    fn apply(&mut self, write: Write) -> Result<(), StoreError> {
        match write {
            Write::InsertTrip(trip) => {
                if self.trip_numbers.contains_key(&trip.number) {
                    return Err(StoreError::DuplicateTripNumber(trip.number));
                }
                self.trip_numbers.insert(trip.number.clone(), trip.id);
                self.trips.insert(trip.id, trip);
            }
            Write::UpdateTrip(mut trip) => {
                let current = self
                    .trips
                    .get(&trip.id)
                    .ok_or_else(|| StoreError::missing("trips", trip.id))?;
                if current.version != trip.version {
                    return Err(StoreError::SerializationFailure(trip.id));
                }
                trip.version += 1;
                self.trips.insert(trip.id, trip);
            }
            Write::DeleteTrip { id, version } => {
                let current = self
                    .trips
                    .get(&id)
                    .ok_or_else(|| StoreError::missing("trips", id))?;
                if current.version != version {
                    return Err(StoreError::SerializationFailure(id));
                }
                if let Some(removed) = self.trips.remove(&id) {
                    self.trip_numbers.remove(&removed.number);
                }
            }
            Write::SetEquipmentStatus(id, status) => {
                self.equipment
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::missing("equipment", id))?
                    .status = status;
            }
            Write::SetDriverStatus(id, status) => {
                self.drivers
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::missing("drivers", id))?
                    .status = status;
            }
            Write::UpdateLoadsheet(sheet) => {
                let slot = self
                    .loadsheets
                    .get_mut(&sheet.id)
                    .ok_or_else(|| StoreError::missing("loadsheets", sheet.id))?;
                *slot = sheet;
            }
            Write::InsertReport(report) => {
                self.reports.insert(report.id, report);
            }
            Write::InsertIssue(issue) => {
                self.issues.insert(issue.id, issue);
            }
            Write::InsertMoraleRating(rating) => {
                if self.ratings.values().any(|r| r.trip_id == rating.trip_id) {
                    return Err(StoreError::DuplicateMoraleRating(rating.trip_id));
                }
                self.ratings.insert(rating.id, rating);
            }
            Write::Hold { resource, trip } => match self.ledger.get(&resource) {
                Some(&holder) if holder != trip => {
                    return Err(StoreError::ResourceHeld { resource, holder });
                }
                _ => {
                    self.ledger.insert(resource, trip);
                }
            },
            Write::Release { resource, trip } => {
                if self.ledger.get(&resource) == Some(&trip) {
                    self.ledger.remove(&resource);
                }
            }
            Write::UpdateLegacyRoute(route) => {
                let slot = self
                    .legacy_routes
                    .get_mut(&route.id)
                    .ok_or_else(|| StoreError::missing("legacy_routes", route.id))?;
                *slot = route;
            }
            Write::InsertTemplate(template) => {
                if self.templates.values().any(|t| t.code == template.code) {
                    return Err(StoreError::DuplicateTemplateCode(template.code));
                }
                self.templates.insert(template.id, template);
            }
        }
        Ok(())
    }
}

struct Sequences([AtomicU64; Sequence::COUNT]);

impl Sequences {
    fn starting_after(maxima: [u64; Sequence::COUNT]) -> Self {
        Self(maxima.map(|max| AtomicU64::new(max + 1)))
    }

    fn next(&self, sequence: Sequence) -> u64 {
        self.0[sequence.index()].fetch_add(1, Ordering::Relaxed)
    }
}

/// A [`Store`] that keeps everything in memory.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    sequences: Sequences,
    /// Index of the write before which the next commit fails.
    fault_at: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::with_tables(Tables::default())
    }

    fn with_tables(tables: Tables) -> Self {
        let max = |ids: Vec<u64>| ids.into_iter().max().unwrap_or(0);
        let maxima = [
            max(tables.trips.keys().map(|id| id.0).collect()),
            max(tables.templates.keys().map(|id| id.0).collect()),
            max(tables.reports.keys().map(|id| id.0).collect()),
            max(tables.issues.keys().map(|id| id.0).collect()),
            max(tables.ratings.keys().map(|id| id.0).collect()),
        ];
        Self {
            tables: RwLock::new(tables),
            sequences: Sequences::starting_after(maxima),
            fault_at: AtomicUsize::new(NO_FAULT),
        }
    }

    /// Build a store from a snapshot, checking its unique constraints.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let mut tables = Tables::default();

        for terminal in snapshot.terminals {
            tables.terminals.insert(terminal.code, terminal);
        }
        let mut codes = BTreeSet::new();
        for template in snapshot.templates {
            if !codes.insert(template.code.clone()) {
                return Err(SnapshotError::Invalid(format!(
                    "duplicate template code {}",
                    template.code
                )));
            }
            tables.templates.insert(template.id, template);
        }
        for entry in snapshot.mileage {
            tables
                .mileage
                .insert((entry.origin, entry.destination), entry);
        }
        for driver in snapshot.drivers {
            tables.drivers.insert(driver.id, driver);
        }
        for unit in snapshot.equipment {
            tables.equipment.insert(unit.id, unit);
        }
        for trip in snapshot.trips {
            if tables
                .trip_numbers
                .insert(trip.number.clone(), trip.id)
                .is_some()
            {
                return Err(SnapshotError::Invalid(format!(
                    "duplicate trip number {}",
                    trip.number
                )));
            }
            tables.trips.insert(trip.id, trip);
        }
        for sheet in snapshot.loadsheets {
            tables.loadsheets.insert(sheet.id, sheet);
        }
        for report in snapshot.reports {
            tables.reports.insert(report.id, report);
        }
        for issue in snapshot.issues {
            tables.issues.insert(issue.id, issue);
        }
        for rating in snapshot.ratings {
            tables.ratings.insert(rating.id, rating);
        }
        for hold in snapshot.ledger {
            tables.ledger.insert(hold.resource, hold.trip);
        }
        for route in snapshot.legacy_routes {
            tables.legacy_routes.insert(route.id, route);
        }

        Ok(Self::with_tables(tables))
    }

    /// Copy the current contents out as a snapshot.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(Snapshot {
            terminals: tables.terminals.values().cloned().collect(),
            templates: tables.templates.values().cloned().collect(),
            mileage: tables.mileage.values().cloned().collect(),
            drivers: tables.drivers.values().cloned().collect(),
            equipment: tables.equipment.values().cloned().collect(),
            trips: tables.trips.values().cloned().collect(),
            loadsheets: tables.loadsheets.values().cloned().collect(),
            reports: tables.reports.values().cloned().collect(),
            issues: tables.issues.values().cloned().collect(),
            ratings: tables.ratings.values().cloned().collect(),
            ledger: tables
                .ledger
                .iter()
                .map(|(&resource, &trip)| Hold { resource, trip })
                .collect(),
            legacy_routes: tables.legacy_routes.values().cloned().collect(),
        })
    }

    /// Make the next commit fail just before applying write number `index`.
    ///
    /// Used to check that a failed commit leaves nothing behind.
    pub fn inject_fault(&self, index: usize) {
        self.fault_at.store(index, Ordering::SeqCst);
    }

    fn commit(&self, work: UnitOfWork) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let fault_at = self.fault_at.swap(NO_FAULT, Ordering::SeqCst);
        let summary = work.summary();

        let mut staged = tables.clone();
        for (index, write) in work.into_writes().into_iter().enumerate() {
            if index == fault_at {
                debug!(index, "injected fault, discarding staged writes");
                return Err(StoreError::InjectedFault(index));
            }
            staged.apply(write)?;
        }

        *tables = staged;
        trace!(writes = %summary, "committed");
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryView<'a> {
    tables: &'a Tables,
    sequences: &'a Sequences,
}

impl StoreView for MemoryView<'_> {
    fn trip(&self, id: TripId) -> Option<&Trip> {
        self.tables.trips.get(&id)
    }

    fn trip_numbers_with_prefix(&self, prefix: &str) -> Vec<&TripNumber> {
        self.tables
            .trip_numbers
            .keys()
            .filter(|n| n.as_str().starts_with(prefix))
            .collect()
    }

    fn template(&self, id: TemplateId) -> Option<&RouteTemplate> {
        self.tables.templates.get(&id)
    }

    fn template_by_code(&self, code: &TemplateCode) -> Option<&RouteTemplate> {
        self.tables.templates.values().find(|t| &t.code == code)
    }

    fn templates_between(
        &self,
        origin: TerminalCode,
        destination: TerminalCode,
    ) -> Vec<&RouteTemplate> {
        self.tables
            .templates
            .values()
            .filter(|t| t.origin == origin && t.destination == destination)
            .collect()
    }

    fn mileage_entry(
        &self,
        origin: TerminalCode,
        destination: TerminalCode,
    ) -> Option<&MileageEntry> {
        self.tables.mileage.get(&(origin, destination))
    }

    fn terminal(&self, code: TerminalCode) -> Option<&Terminal> {
        self.tables.terminals.get(&code)
    }

    fn driver(&self, id: DriverId) -> Option<&Driver> {
        self.tables.drivers.get(&id)
    }

    fn equipment(&self, id: EquipmentId) -> Option<&Equipment> {
        self.tables.equipment.get(&id)
    }

    fn loadsheet(&self, id: LoadsheetId) -> Option<&Loadsheet> {
        self.tables.loadsheets.get(&id)
    }

    fn loadsheets_for_trip(&self, trip: TripId) -> Vec<&Loadsheet> {
        self.tables
            .loadsheets
            .values()
            .filter(|s| s.trip_id == Some(trip))
            .collect()
    }

    fn reports_for_trip(&self, trip: TripId) -> Vec<&DriverTripReport> {
        self.tables
            .reports
            .values()
            .filter(|r| r.trip_id == trip)
            .collect()
    }

    fn issues_for_trip(&self, trip: TripId) -> Vec<&EquipmentIssue> {
        self.tables
            .issues
            .values()
            .filter(|i| i.trip_id == trip)
            .collect()
    }

    fn morale_rating_for_trip(&self, trip: TripId) -> Option<&MoraleRating> {
        self.tables.ratings.values().find(|r| r.trip_id == trip)
    }

    fn holder(&self, resource: ResourceKey) -> Option<TripId> {
        self.tables.ledger.get(&resource).copied()
    }

    fn holds_of(&self, trip: TripId) -> Vec<ResourceKey> {
        self.tables
            .ledger
            .iter()
            .filter(|(_, holder)| **holder == trip)
            .map(|(resource, _)| *resource)
            .collect()
    }

    fn legacy_route_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .tables
            .legacy_routes
            .values()
            .map(|r| r.name.as_str())
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    fn legacy_routes_named(&self, name: &str) -> Vec<&LegacyRoute> {
        self.tables
            .legacy_routes
            .values()
            .filter(|r| r.name == name)
            .collect()
    }

    fn next_id(&self, sequence: Sequence) -> u64 {
        self.sequences.next(sequence)
    }
}

impl Store for MemoryStore {
    fn read<T>(&self, f: impl FnOnce(&dyn StoreView) -> T) -> Result<T, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        let view = MemoryView {
            tables: &tables,
            sequences: &self.sequences,
        };
        Ok(f(&view))
    }

    fn transaction<T, E>(
        &self,
        f: impl FnOnce(&dyn StoreView) -> Result<(T, UnitOfWork), E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let (value, work) = {
            let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
            let view = MemoryView {
                tables: &tables,
                sequences: &self.sequences,
            };
            f(&view)?
        };

        if !work.is_empty() {
            self.commit(work)?;
        }
        Ok(value)
    }
}
