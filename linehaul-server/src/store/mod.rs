//! Transactional storage for trips, fleet and network data.
//!
//! Every lifecycle transition is expressed as a [`UnitOfWork`] built against
//! a consistent [`StoreView`] and committed atomically by a [`Store`].
//! Uniqueness of trip numbers is enforced here, at commit time, rather than
//! by the allocation arithmetic.

mod error;
mod ledger;
mod memory;
mod snapshot;
mod unit_of_work;
mod view;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::StoreError;
pub use ledger::{Hold, ResourceKey};
pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotError, SnapshotFile};
pub use unit_of_work::{UnitOfWork, Write};
pub use view::{Sequence, Store, StoreView};
