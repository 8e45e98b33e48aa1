//! The trip state machine.
//!
//! Each operation reads the trip and everything it touches from one
//! [`StoreView`], checks its preconditions against that view, and returns a
//! [`UnitOfWork`] that the store commits atomically. Nothing here writes
//! outside a transaction, so a rejected or failed operation leaves no trace.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::domain::{
    DriverId, DriverTripReport, EquipmentIssue, IssueId, Loadsheet, LoadsheetId, MoraleRating,
    RatingId, ReportId, TemplateCode, TerminalCode, Trip, TripId, TripNumber, TripStatus,
};
use crate::store::{ResourceKey, Sequence, Store, StoreError, StoreView, UnitOfWork, Write};

use super::allocator::allocate;
use super::ledger::{couple_equipment, hold_all, rebalance, release, seat_crew, status_writes};
use super::request::validate_rating;
use super::{
    ArrivalDetails, ArrivalOutcome, CoordinatorConfig, Crew, EquipmentSet, IssueReport,
    LifecycleError, TripAssignments, TripDetail,
};

/// Drives trips through their lifecycle.
///
/// The coordinator is the only writer of driver and equipment status.
pub struct Coordinator<S> {
    store: Arc<S>,
    config: CoordinatorConfig,
    clock: fn() -> DateTime<Utc>,
}

impl<S: Store> Coordinator<S> {
    pub fn new(store: Arc<S>, config: CoordinatorConfig) -> Self {
        Self {
            store,
            config,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for "now" timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn trip(&self, id: TripId) -> Result<Trip, LifecycleError> {
        self.store
            .read(|view| view.trip(id).cloned())?
            .ok_or(LifecycleError::TripNotFound(id))
    }

    /// A trip together with its loadsheets and arrival records.
    pub fn trip_detail(&self, id: TripId) -> Result<TripDetail, LifecycleError> {
        self.store
            .read(|view| {
                let trip = view.trip(id)?.clone();
                Some(TripDetail {
                    loadsheets: view.loadsheets_for_trip(id).into_iter().cloned().collect(),
                    reports: view.reports_for_trip(id).into_iter().cloned().collect(),
                    issues: view.issues_for_trip(id).into_iter().cloned().collect(),
                    morale: view.morale_rating_for_trip(id).cloned(),
                    trip,
                })
            })?
            .ok_or(LifecycleError::TripNotFound(id))
    }

    /// Create a trip from the template `code` for `date`.
    ///
    /// The trip number is allocated inside the inserting transaction. When a
    /// concurrent create wins the same number the store rejects the insert
    /// and allocation is retried, up to
    /// [`CoordinatorConfig::max_allocation_attempts`] times.
    pub fn create_trip(
        &self,
        code: &TemplateCode,
        date: NaiveDate,
        assignments: &TripAssignments,
    ) -> Result<Trip, LifecycleError> {
        let attempts = self.config.max_allocation_attempts.max(1);
        for attempt in 1..=attempts {
            match self.try_create(code, date, assignments) {
                Err(LifecycleError::DuplicateTripNumber(number)) => {
                    debug!(%number, attempt, "trip number taken, allocating again");
                }
                Ok(trip) => {
                    info!(
                        trip_id = %trip.id,
                        trip = %trip.number,
                        status = %trip.status,
                        "trip created"
                    );
                    return Ok(trip);
                }
                Err(e) => return Err(e),
            }
        }

        let prefix = TripNumber::prefix(code, date);
        warn!(%prefix, attempts, "gave up allocating a trip number");
        Err(LifecycleError::TripNumberConflict { prefix, attempts })
    }

    fn try_create(
        &self,
        code: &TemplateCode,
        date: NaiveDate,
        assignments: &TripAssignments,
    ) -> Result<Trip, LifecycleError> {
        self.store.transaction(|view| {
            let template = view
                .template_by_code(code)
                .ok_or_else(|| LifecycleError::TemplateNotFound(code.clone()))?;
            if !template.active {
                return Err(LifecycleError::Validation(format!(
                    "route template {code} is inactive"
                )));
            }

            let (planned_departure, planned_arrival) = template.planned_times(date);
            let mut trip = Trip {
                id: TripId(view.next_id(Sequence::Trip)),
                number: allocate(view, code, date),
                template_id: template.id,
                dispatch_date: date,
                planned_departure,
                planned_arrival,
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
            };
            seat_crew(view, &mut trip, assignments.crew).map_err(LifecycleError::into_validation)?;
            couple_equipment(view, &mut trip, assignments.equipment)
                .map_err(LifecycleError::into_validation)?;
            if let Some(notes) = &assignments.notes {
                trip.append_note(notes);
            }
            if trip.has_assignments() {
                trip.status = TripStatus::Assigned;
            }

            let mut work = UnitOfWork::new();
            work.push(Write::InsertTrip(trip.clone()));
            hold_all(view, &trip, &mut work)?;
            Ok((trip, work))
        })
    }

    /// Seat a primary and optional team driver, replacing the current crew.
    pub fn assign_driver(
        &self,
        id: TripId,
        driver: DriverId,
        team_driver: Option<DriverId>,
    ) -> Result<Trip, LifecycleError> {
        let (from, trip) = self.change(id, |view, trip, work| {
            reject_terminal(trip, "assign a driver to")?;
            let mut next = trip.clone();
            seat_crew(
                view,
                &mut next,
                Crew {
                    driver: Some(driver),
                    team_driver,
                },
            )?;
            mark_assigned(&mut next);
            rebalance(view, trip, &next, work)?;
            Ok((trip.status, stage(work, next)))
        })?;
        log_transition("assign_driver", from, &trip);
        Ok(trip)
    }

    /// Couple units to the trip, replacing every slot.
    pub fn assign_equipment(&self, id: TripId, set: EquipmentSet) -> Result<Trip, LifecycleError> {
        let (from, trip) = self.change(id, |view, trip, work| {
            reject_terminal(trip, "assign equipment to")?;
            let mut next = trip.clone();
            couple_equipment(view, &mut next, set).map_err(LifecycleError::into_validation)?;
            mark_assigned(&mut next);
            rebalance(view, trip, &next, work)?;
            Ok((trip.status, stage(work, next)))
        })?;
        log_transition("assign_equipment", from, &trip);
        Ok(trip)
    }

    /// The acting driver takes the trip on the road.
    pub fn dispatch(
        &self,
        id: TripId,
        actor: DriverId,
        notes: Option<&str>,
    ) -> Result<Trip, LifecycleError> {
        let now = (self.clock)();
        let (from, trip) = self.change(id, |_, trip, work| {
            authorize(trip, actor)?;
            require(
                trip,
                "dispatch",
                &[TripStatus::Assigned, TripStatus::Dispatched],
                "ASSIGNED or DISPATCHED",
            )?;
            let mut next = trip.clone();
            next.status = TripStatus::InTransit;
            next.actual_departure = Some(now);
            if let Some(notes) = notes {
                next.append_note(notes);
            }
            work.extend(status_writes(&next, TripStatus::InTransit));
            Ok((trip.status, stage(work, next)))
        })?;
        log_transition("dispatch", from, &trip);
        Ok(trip)
    }

    /// The acting driver reports the trip in at its destination.
    ///
    /// Frees the crew and units, hands linked loadsheets over to the
    /// destination terminal and files the driver's report. Calling this on a
    /// trip that has already arrived is an error, never a silent success.
    pub fn arrive(
        &self,
        id: TripId,
        actor: DriverId,
        details: &ArrivalDetails,
    ) -> Result<ArrivalOutcome, LifecycleError> {
        let now = (self.clock)();
        let (from, outcome) = self.change(id, |view, trip, work| {
            authorize(trip, actor)?;
            require(trip, "arrive", &[TripStatus::InTransit], "IN_TRANSIT")?;
            details.validate()?;
            let template = view
                .template(trip.template_id)
                .ok_or_else(|| StoreError::missing("templates", trip.template_id))?;
            let arrived_at = details.arrived_at.unwrap_or(now);

            let mut next = trip.clone();
            next.status = TripStatus::Arrived;
            next.actual_arrival = Some(arrived_at);
            next.actual_miles = details.actual_miles.or(template.distance_miles);
            work.extend(status_writes(&next, TripStatus::Arrived));
            release(&next, view.holds_of(trip.id), work);

            let released = unlink_loadsheets(view, trip, Some(template.destination), work);

            let report = DriverTripReport {
                id: ReportId(view.next_id(Sequence::Report)),
                trip_id: trip.id,
                driver_id: actor,
                arrived_at,
                drop_hooks: details.drop_hooks,
                chain_ups: details.chain_ups,
                wait_start: details.wait_start,
                wait_end: details.wait_end,
                wait_minutes: details.wait_minutes(),
                wait_reason: details.wait_reason.clone(),
                notes: details.notes.clone(),
            };
            work.push(Write::InsertReport(report.clone()));

            let issue = details
                .issue
                .as_ref()
                .and_then(IssueReport::complete)
                .map(|(kind, unit_number, description)| EquipmentIssue {
                    id: IssueId(view.next_id(Sequence::Issue)),
                    trip_id: trip.id,
                    driver_id: actor,
                    kind,
                    unit_number: unit_number.to_string(),
                    description: description.to_string(),
                    reported_at: arrived_at,
                });
            if let Some(issue) = &issue {
                work.push(Write::InsertIssue(issue.clone()));
            }

            let morale = match (view.morale_rating_for_trip(trip.id), details.morale) {
                (Some(existing), _) => Some(existing.clone()),
                (None, Some(rating)) => {
                    let rating = MoraleRating {
                        id: RatingId(view.next_id(Sequence::Rating)),
                        trip_id: trip.id,
                        driver_id: actor,
                        rating,
                        rated_at: arrived_at,
                    };
                    work.push(Write::InsertMoraleRating(rating.clone()));
                    Some(rating)
                }
                (None, None) => None,
            };

            let outcome = ArrivalOutcome {
                trip: stage(work, next),
                report,
                issue,
                morale,
                released,
            };
            Ok((trip.status, outcome))
        })?;
        log_transition("arrive", from, &outcome.trip);
        Ok(outcome)
    }

    /// Record the crew's morale rating for a finished trip.
    ///
    /// Resubmitting returns the rating already on file.
    pub fn rate_trip(
        &self,
        id: TripId,
        actor: DriverId,
        rating: u8,
    ) -> Result<MoraleRating, LifecycleError> {
        let now = (self.clock)();
        let result = self.change(id, |view, trip, work| {
            authorize(trip, actor)?;
            require(
                trip,
                "rate",
                &[TripStatus::Arrived, TripStatus::Completed],
                "ARRIVED or COMPLETED",
            )?;
            validate_rating(rating)?;
            if let Some(existing) = view.morale_rating_for_trip(trip.id) {
                return Ok(existing.clone());
            }
            let rating = MoraleRating {
                id: RatingId(view.next_id(Sequence::Rating)),
                trip_id: trip.id,
                driver_id: actor,
                rating,
                rated_at: now,
            };
            work.push(Write::InsertMoraleRating(rating.clone()));
            Ok(rating)
        });

        match result {
            // Lost a race with an identical submission.
            Err(LifecycleError::Storage(StoreError::DuplicateMoraleRating(trip))) => self
                .store
                .read(|view| view.morale_rating_for_trip(trip).cloned())?
                .ok_or(LifecycleError::Storage(StoreError::DuplicateMoraleRating(
                    trip,
                ))),
            other => other,
        }
    }

    /// Cancel a trip that has not finished, freeing everything it holds.
    pub fn cancel(&self, id: TripId, reason: Option<&str>) -> Result<Trip, LifecycleError> {
        let (from, trip) = self.change(id, |view, trip, work| {
            reject_terminal(trip, "cancel")?;
            let mut next = trip.clone();
            next.status = TripStatus::Cancelled;
            if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
                next.append_note(&format!("Cancelled: {reason}"));
            }
            work.extend(status_writes(&next, TripStatus::Cancelled));
            release(&next, view.holds_of(trip.id), work);
            unlink_loadsheets(view, trip, None, work);
            Ok((trip.status, stage(work, next)))
        })?;
        log_transition("cancel", from, &trip);
        Ok(trip)
    }

    pub fn complete(&self, id: TripId) -> Result<Trip, LifecycleError> {
        let (from, trip) = self.change(id, |_, trip, work| {
            require(trip, "complete", &[TripStatus::Arrived], "ARRIVED")?;
            let mut next = trip.clone();
            next.status = TripStatus::Completed;
            Ok((trip.status, stage(work, next)))
        })?;
        log_transition("complete", from, &trip);
        Ok(trip)
    }

    /// Administrative move along any permitted edge.
    ///
    /// Driver and equipment statuses follow the target status. A finishing
    /// move frees everything the trip holds and takes its loadsheets off it,
    /// handing them to the destination terminal on arrival. No arrival
    /// records are filed.
    pub fn update_status(&self, id: TripId, target: TripStatus) -> Result<Trip, LifecycleError> {
        let now = (self.clock)();
        let (from, trip) = self.change(id, |view, trip, work| {
            if !trip.status.can_transition_to(target) {
                return Err(LifecycleError::ForbiddenTransition {
                    trip: trip.number.clone(),
                    from: trip.status,
                    to: target,
                });
            }
            let mut next = trip.clone();
            next.status = target;
            match target {
                TripStatus::InTransit if next.actual_departure.is_none() => {
                    next.actual_departure = Some(now);
                }
                TripStatus::Arrived if next.actual_arrival.is_none() => {
                    next.actual_arrival = Some(now);
                }
                _ => {}
            }
            work.extend(status_writes(&next, target));
            if target.is_terminal() {
                release(&next, view.holds_of(trip.id), work);
                let handover = match target {
                    TripStatus::Arrived => Some(
                        view.template(trip.template_id)
                            .ok_or_else(|| StoreError::missing("templates", trip.template_id))?
                            .destination,
                    ),
                    _ => None,
                };
                unlink_loadsheets(view, trip, handover, work);
            }
            Ok((trip.status, stage(work, next)))
        })?;
        log_transition("update_status", from, &trip);
        Ok(trip)
    }

    /// Put a manifest on a trip that has not finished.
    pub fn link_loadsheet(
        &self,
        id: TripId,
        sheet: LoadsheetId,
    ) -> Result<Loadsheet, LifecycleError> {
        let linked = self.change(id, |view, trip, work| {
            reject_terminal(trip, "link a loadsheet to")?;
            let current = view
                .loadsheet(sheet)
                .ok_or(LifecycleError::LoadsheetNotFound(sheet))?;
            match current.trip_id {
                Some(holder) if holder == trip.id => return Ok(current.clone()),
                Some(holder) => {
                    return Err(LifecycleError::LoadsheetLinked {
                        loadsheet: sheet,
                        trip: holder,
                    });
                }
                None => {}
            }
            let linked = Loadsheet {
                trip_id: Some(trip.id),
                ..current.clone()
            };
            work.push(Write::Hold {
                resource: ResourceKey::Loadsheet(sheet),
                trip: trip.id,
            });
            work.push(Write::UpdateLoadsheet(linked.clone()));
            // Touch the trip so a concurrent arrival or cancel conflicts.
            stage(work, trip.clone());
            Ok(linked)
        })?;
        info!(trip_id = %id, loadsheet = %linked.manifest_number, "loadsheet linked");
        Ok(linked)
    }

    /// Remove a trip that never ran.
    pub fn delete_trip(&self, id: TripId) -> Result<TripNumber, LifecycleError> {
        let number = self.change(id, |view, trip, work| {
            require(
                trip,
                "delete",
                &[TripStatus::Planned, TripStatus::Cancelled],
                "PLANNED or CANCELLED",
            )?;
            let count = view.loadsheets_for_trip(trip.id).len();
            if count > 0 {
                return Err(LifecycleError::HasDependents {
                    trip: trip.number.clone(),
                    count,
                });
            }
            release(trip, view.holds_of(trip.id), work);
            work.push(Write::DeleteTrip {
                id: trip.id,
                version: trip.version,
            });
            Ok(trip.number.clone())
        })?;
        info!(trip_id = %id, trip = %number, "trip deleted");
        Ok(number)
    }

    /// Run `f` against trip `id` inside one transaction.
    fn change<T>(
        &self,
        id: TripId,
        f: impl FnOnce(&dyn StoreView, &Trip, &mut UnitOfWork) -> Result<T, LifecycleError>,
    ) -> Result<T, LifecycleError> {
        self.store.transaction(|view| {
            let trip = view.trip(id).ok_or(LifecycleError::TripNotFound(id))?;
            let mut work = UnitOfWork::new();
            let value = f(view, trip, &mut work)?;
            Ok((value, work))
        })
    }
}

/// Queue the update of `trip` and return it as it will read once committed.
fn stage(work: &mut UnitOfWork, trip: Trip) -> Trip {
    let committed = Trip {
        version: trip.version + 1,
        ..trip.clone()
    };
    work.push(Write::UpdateTrip(trip));
    committed
}

/// Take every loadsheet off `trip`, moving it to `handover` when given.
fn unlink_loadsheets(
    view: &dyn StoreView,
    trip: &Trip,
    handover: Option<TerminalCode>,
    work: &mut UnitOfWork,
) -> Vec<Loadsheet> {
    let released: Vec<Loadsheet> = view
        .loadsheets_for_trip(trip.id)
        .into_iter()
        .map(|sheet| Loadsheet {
            trip_id: None,
            origin: handover.unwrap_or(sheet.origin),
            ..sheet.clone()
        })
        .collect();
    work.extend(released.iter().cloned().map(Write::UpdateLoadsheet));
    released
}

fn authorize(trip: &Trip, actor: DriverId) -> Result<(), LifecycleError> {
    if trip.is_crewed_by(actor) {
        Ok(())
    } else {
        Err(LifecycleError::NotAssignedToTrip {
            trip: trip.number.clone(),
            driver: actor,
        })
    }
}

fn require(
    trip: &Trip,
    operation: &'static str,
    allowed: &[TripStatus],
    expected: &'static str,
) -> Result<(), LifecycleError> {
    if allowed.contains(&trip.status) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidState {
            trip: trip.number.clone(),
            operation,
            status: trip.status,
            expected,
        })
    }
}

fn reject_terminal(trip: &Trip, operation: &'static str) -> Result<(), LifecycleError> {
    if trip.status.is_terminal() {
        Err(LifecycleError::InvalidState {
            trip: trip.number.clone(),
            operation,
            status: trip.status,
            expected: "a trip that has not finished",
        })
    } else {
        Ok(())
    }
}

fn mark_assigned(trip: &mut Trip) {
    if trip.status == TripStatus::Planned && trip.has_assignments() {
        trip.status = TripStatus::Assigned;
    }
}

fn log_transition(operation: &'static str, from: TripStatus, trip: &Trip) {
    info!(
        operation,
        trip_id = %trip.id,
        trip = %trip.number,
        %from,
        to = %trip.status,
        "trip updated"
    );
}
