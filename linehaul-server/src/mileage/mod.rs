//! Distances between terminals.
//!
//! Curated data always wins over geometry: route template distances, then
//! the mileage matrix, and only then a haversine estimate from terminal
//! coordinates.

mod haversine;
mod resolver;

pub use haversine::{
    EARTH_RADIUS_MILES, ROAD_CIRCUITY, great_circle_miles, road_miles_estimate,
};
pub use resolver::{
    LookupPath, Mileage, MileageError, MileageResolver, MileageSource, resolve_in,
};
