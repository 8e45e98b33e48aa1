//! Trip lifecycle coordination.
//!
//! The [`Coordinator`] moves trips from planning through dispatch, transit
//! and arrival. Each transition updates the trip, its crew, its equipment,
//! its loadsheets and the resource ledger together as one unit of work.

mod allocator;
mod config;
mod coordinator;
mod error;
mod ledger;
mod request;

#[cfg(test)]
mod coordinator_tests;

pub use allocator::{allocate, next_sequence};
pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use error::{ErrorKind, LifecycleError};
pub use request::{
    ArrivalDetails, ArrivalOutcome, Crew, EquipmentSet, IssueReport, TripAssignments, TripDetail,
};
