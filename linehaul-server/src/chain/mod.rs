//! Leg order reconstruction for legacy multi-leg routes.
//!
//! Legacy routes were recorded one row per leg with no ordering. The pure
//! [`reconstruct`] function infers the order and day offsets; [`ChainRunner`]
//! writes the results back and turns processed legs into route templates.

mod batch;
mod reconstruct;

pub use batch::{ChainError, ChainRunner, RouteChain, SeedSummary};
pub use reconstruct::{
    LegInput, OrderedLeg, OrderingMethod, Reconstruction, ReviewFlag, reconstruct,
};
