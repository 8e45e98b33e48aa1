//! The persistence seam.
//!
//! The coordinator, resolver and reconstruction batch only ever talk to
//! storage through these traits, so they can run against [`super::MemoryStore`]
//! in tests and in the development server alike.

use crate::domain::{
    Driver, DriverId, DriverTripReport, Equipment, EquipmentId, EquipmentIssue, LegacyRoute, Loadsheet,
    LoadsheetId, MileageEntry, MoraleRating, RouteTemplate, TemplateCode, TemplateId, Terminal,
    TerminalCode, Trip, TripId, TripNumber,
};

use super::{ResourceKey, StoreError, UnitOfWork};

/// Id sequences handed out by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Trip,
    Template,
    Report,
    Issue,
    Rating,
}

impl Sequence {
    pub(crate) const COUNT: usize = 5;

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A consistent read-only view of the data.
pub trait StoreView {
    fn trip(&self, id: TripId) -> Option<&Trip>;

    /// All trip numbers starting with `prefix`.
    fn trip_numbers_with_prefix(&self, prefix: &str) -> Vec<&TripNumber>;

    fn template(&self, id: TemplateId) -> Option<&RouteTemplate>;

    fn template_by_code(&self, code: &TemplateCode) -> Option<&RouteTemplate>;

    /// Templates whose origin and destination match exactly, in id order.
    fn templates_between(&self, origin: TerminalCode, destination: TerminalCode)
    -> Vec<&RouteTemplate>;

    /// A curated mileage entry keyed exactly `origin → destination`.
    fn mileage_entry(&self, origin: TerminalCode, destination: TerminalCode)
    -> Option<&MileageEntry>;

    fn terminal(&self, code: TerminalCode) -> Option<&Terminal>;

    fn driver(&self, id: DriverId) -> Option<&Driver>;

    fn equipment(&self, id: EquipmentId) -> Option<&Equipment>;

    fn loadsheet(&self, id: LoadsheetId) -> Option<&Loadsheet>;

    fn loadsheets_for_trip(&self, trip: TripId) -> Vec<&Loadsheet>;

    fn reports_for_trip(&self, trip: TripId) -> Vec<&DriverTripReport>;

    fn issues_for_trip(&self, trip: TripId) -> Vec<&EquipmentIssue>;

    fn morale_rating_for_trip(&self, trip: TripId) -> Option<&MoraleRating>;

    /// The trip currently holding `resource`, if any.
    fn holder(&self, resource: ResourceKey) -> Option<TripId>;

    /// Every ledger resource held by `trip`.
    fn holds_of(&self, trip: TripId) -> Vec<ResourceKey>;

    /// Distinct legacy route names, sorted.
    fn legacy_route_names(&self) -> Vec<String>;

    /// Legacy rows sharing `name`, in id order.
    fn legacy_routes_named(&self, name: &str) -> Vec<&LegacyRoute>;

    /// Take the next value of an id sequence. Values are never reused.
    fn next_id(&self, sequence: Sequence) -> u64;
}

/// Transactional storage.
///
/// `transaction` runs `f` against a consistent view, then commits the
/// returned [`UnitOfWork`] atomically: either every write is applied or the
/// store is left untouched and an error is returned.
pub trait Store: Send + Sync {
    fn read<T>(&self, f: impl FnOnce(&dyn StoreView) -> T) -> Result<T, StoreError>;

    fn transaction<T, E>(
        &self,
        f: impl FnOnce(&dyn StoreView) -> Result<(T, UnitOfWork), E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>;
}
