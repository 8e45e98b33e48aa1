//! Resource bookkeeping for transitions.
//!
//! Holds say which trip owns a driver or unit; statuses say what that driver
//! or unit is doing. Both are derived here from the trip row so that every
//! transition writes them the same way.

use std::collections::BTreeSet;

use crate::domain::{
    Driver, DriverId, DriverStatus, Equipment, EquipmentId, EquipmentSlot, EquipmentStatus, Trip,
    TripStatus,
};
use crate::store::{ResourceKey, StoreView, UnitOfWork, Write};

use super::{Crew, EquipmentSet, LifecycleError};

/// Every ledger key a trip row references.
pub(crate) fn resources(trip: &Trip) -> BTreeSet<ResourceKey> {
    trip.drivers()
        .into_iter()
        .map(ResourceKey::Driver)
        .chain(
            trip.attached_equipment()
                .into_iter()
                .map(ResourceKey::Equipment),
        )
        .collect()
}

pub(crate) fn find_driver(view: &dyn StoreView, id: DriverId) -> Result<&Driver, LifecycleError> {
    view.driver(id).ok_or(LifecycleError::DriverNotFound(id))
}

/// The unit `id`, checked to fit `slot`.
pub(crate) fn find_unit(
    view: &dyn StoreView,
    slot: EquipmentSlot,
    id: EquipmentId,
) -> Result<&Equipment, LifecycleError> {
    let unit = view
        .equipment(id)
        .ok_or(LifecycleError::EquipmentNotFound(id))?;
    if unit.kind != slot.kind() {
        return Err(LifecycleError::Validation(format!(
            "unit {} is a {}, not a {}",
            unit.unit_number,
            unit.kind,
            slot.kind()
        )));
    }
    Ok(unit)
}

/// Seat `crew` on `trip` after checking both drivers exist.
pub(crate) fn seat_crew(
    view: &dyn StoreView,
    trip: &mut Trip,
    crew: Crew,
) -> Result<(), LifecycleError> {
    if crew.driver.is_some() && crew.driver == crew.team_driver {
        return Err(LifecycleError::Validation(
            "primary and team driver must be different people".to_string(),
        ));
    }
    for id in crew.driver.into_iter().chain(crew.team_driver) {
        find_driver(view, id)?;
    }
    trip.driver = crew.driver;
    trip.team_driver = crew.team_driver;
    Ok(())
}

/// Couple `set` to `trip` after checking each unit exists and fits its slot.
pub(crate) fn couple_equipment(
    view: &dyn StoreView,
    trip: &mut Trip,
    set: EquipmentSet,
) -> Result<(), LifecycleError> {
    let requested = [
        (EquipmentSlot::Truck, set.truck),
        (EquipmentSlot::Trailer, set.trailer),
        (EquipmentSlot::Trailer2, set.trailer2),
        (EquipmentSlot::Dolly, set.dolly),
    ];
    let mut seen = BTreeSet::new();
    for (slot, unit) in requested {
        if let Some(id) = unit {
            find_unit(view, slot, id)?;
            if !seen.insert(id) {
                return Err(LifecycleError::Validation(format!(
                    "unit {id} is assigned to more than one slot"
                )));
            }
        }
        trip.set_equipment(slot, unit);
    }
    Ok(())
}

/// Move the trip's holds from what `before` referenced to what `after` does.
///
/// A trip that is already rolling also brings the status of newly attached
/// resources in line with its own, and frees the ones it let go.
pub(crate) fn rebalance(
    view: &dyn StoreView,
    before: &Trip,
    after: &Trip,
    work: &mut UnitOfWork,
) -> Result<(), LifecycleError> {
    let old = resources(before);
    let new = resources(after);

    for &resource in new.difference(&old) {
        if let Some(holder) = view.holder(resource)
            && holder != after.id
        {
            return Err(LifecycleError::ResourceBusy { resource, holder });
        }
        work.push(Write::Hold {
            resource,
            trip: after.id,
        });
    }

    let released: Vec<ResourceKey> = old.difference(&new).copied().collect();
    release(after, released.iter().copied(), work);

    if matches!(after.status, TripStatus::Dispatched | TripStatus::InTransit) {
        work.extend(status_writes(after, after.status));
        work.extend(released.into_iter().filter_map(|resource| match resource {
            ResourceKey::Driver(id) => Some(Write::SetDriverStatus(id, DriverStatus::Available)),
            ResourceKey::Equipment(id) => {
                Some(Write::SetEquipmentStatus(id, EquipmentStatus::Available))
            }
            ResourceKey::Loadsheet(_) => None,
        }));
    }
    Ok(())
}

/// Holds on fresh resources for a trip that is being inserted.
pub(crate) fn hold_all(
    view: &dyn StoreView,
    trip: &Trip,
    work: &mut UnitOfWork,
) -> Result<(), LifecycleError> {
    for resource in resources(trip) {
        if let Some(holder) = view.holder(resource) {
            return Err(LifecycleError::ResourceBusy { resource, holder });
        }
        work.push(Write::Hold {
            resource,
            trip: trip.id,
        });
    }
    Ok(())
}

pub(crate) fn release(
    trip: &Trip,
    resources: impl IntoIterator<Item = ResourceKey>,
    work: &mut UnitOfWork,
) {
    work.extend(resources.into_iter().map(|resource| Write::Release {
        resource,
        trip: trip.id,
    }));
}

/// Driver and equipment status writes implied by `trip` entering `status`.
///
/// The team driver rides along on duty while the primary drives.
pub(crate) fn status_writes(trip: &Trip, status: TripStatus) -> Vec<Write> {
    let mut writes = Vec::new();
    if let Some(unit_status) = status.implied_equipment_status() {
        writes.extend(
            trip.attached_equipment()
                .into_iter()
                .map(|id| Write::SetEquipmentStatus(id, unit_status)),
        );
    }
    if let Some(driver_status) = status.implied_driver_status() {
        if let Some(id) = trip.driver {
            writes.push(Write::SetDriverStatus(id, driver_status));
        }
        if let Some(id) = trip.team_driver {
            let team_status = match driver_status {
                DriverStatus::Driving => DriverStatus::OnDuty,
                other => other,
            };
            writes.push(Write::SetDriverStatus(id, team_status));
        }
    }
    writes
}
