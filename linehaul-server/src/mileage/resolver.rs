//! Distance lookup between terminals.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::TerminalCode;
use crate::store::{Store, StoreError, StoreView};

use super::haversine::road_miles_estimate;

/// Where a mileage figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MileageSource {
    /// A route template's curated distance.
    Profile,
    /// The curated mileage matrix.
    Matrix,
    /// Haversine estimate from terminal coordinates.
    Gps,
}

impl MileageSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MileageSource::Profile => "profile",
            MileageSource::Matrix => "matrix",
            MileageSource::Gps => "gps",
        }
    }
}

impl fmt::Display for MileageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mileage {
    pub miles: f64,
    pub source: MileageSource,
}

/// Which curated tables a lookup consults before falling back to GPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupPath {
    /// Route templates, then the matrix.
    Templates,
    /// The matrix only.
    Matrix,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MileageError {
    #[error("terminal {0} not found")]
    UnknownTerminal(TerminalCode),

    /// No curated distance and no coordinates to estimate from.
    #[error("no mileage known between {origin} and {destination}")]
    NoData {
        origin: TerminalCode,
        destination: TerminalCode,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Resolves distances from curated data first, estimating only as a last
/// resort. A missing answer is an error, never zero miles.
pub struct MileageResolver<S> {
    store: Arc<S>,
}

impl<S: Store> MileageResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Template distance (either direction), then the matrix (either
    /// direction), then a GPS estimate.
    pub fn resolve(
        &self,
        origin: TerminalCode,
        destination: TerminalCode,
    ) -> Result<Mileage, MileageError> {
        self.lookup(origin, destination, LookupPath::Templates)
    }

    /// The matrix (either direction), then a GPS estimate.
    pub fn resolve_matrix(
        &self,
        origin: TerminalCode,
        destination: TerminalCode,
    ) -> Result<Mileage, MileageError> {
        self.lookup(origin, destination, LookupPath::Matrix)
    }

    pub fn lookup(
        &self,
        origin: TerminalCode,
        destination: TerminalCode,
        path: LookupPath,
    ) -> Result<Mileage, MileageError> {
        let mileage = self
            .store
            .read(|view| resolve_in(view, origin, destination, path))??;
        debug!(
            %origin,
            %destination,
            source = %mileage.source,
            miles = mileage.miles,
            "mileage resolved"
        );
        Ok(mileage)
    }
}

/// Resolve against a single consistent view.
pub fn resolve_in(
    view: &dyn StoreView,
    origin: TerminalCode,
    destination: TerminalCode,
    path: LookupPath,
) -> Result<Mileage, MileageError> {
    let from = view
        .terminal(origin)
        .ok_or(MileageError::UnknownTerminal(origin))?;
    let to = view
        .terminal(destination)
        .ok_or(MileageError::UnknownTerminal(destination))?;

    let curated = match path {
        LookupPath::Templates => template_miles(view, origin, destination)
            .or_else(|| template_miles(view, destination, origin))
            .map(|miles| (miles, MileageSource::Profile))
            .or_else(|| matrix(view, origin, destination)),
        LookupPath::Matrix => matrix(view, origin, destination),
    };
    if let Some((miles, source)) = curated {
        return Ok(Mileage { miles, source });
    }

    match (from.coordinates(), to.coordinates()) {
        (Some(a), Some(b)) => Ok(Mileage {
            miles: road_miles_estimate(a, b),
            source: MileageSource::Gps,
        }),
        _ => Err(MileageError::NoData {
            origin,
            destination,
        }),
    }
}

fn template_miles(
    view: &dyn StoreView,
    origin: TerminalCode,
    destination: TerminalCode,
) -> Option<f64> {
    view.templates_between(origin, destination)
        .into_iter()
        .filter(|t| t.active)
        .find_map(|t| t.distance_miles)
}

fn matrix(
    view: &dyn StoreView,
    origin: TerminalCode,
    destination: TerminalCode,
) -> Option<(f64, MileageSource)> {
    let active = |o: TerminalCode, d: TerminalCode| {
        view.mileage_entry(o, d)
            .filter(|entry| entry.active)
            .map(|entry| entry.miles)
    };
    active(origin, destination)
        .or_else(|| active(destination, origin))
        .map(|miles| (miles, MileageSource::Matrix))
}
