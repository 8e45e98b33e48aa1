//! JSON snapshots of the store.
//!
//! The development server seeds itself from a snapshot file and can write
//! one back out. A snapshot is a plain list of rows per table.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{
    Driver, DriverTripReport, Equipment, EquipmentIssue, LegacyRoute, Loadsheet, MileageEntry,
    MoraleRating, RouteTemplate, Terminal, Trip,
};

use super::Hold;

/// Errors reading, writing or validating a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("snapshot JSON error: {message}")]
    Json { message: String },

    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

/// Every table's rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub terminals: Vec<Terminal>,
    pub templates: Vec<RouteTemplate>,
    pub mileage: Vec<MileageEntry>,
    pub drivers: Vec<Driver>,
    pub equipment: Vec<Equipment>,
    pub trips: Vec<Trip>,
    pub loadsheets: Vec<Loadsheet>,
    pub reports: Vec<DriverTripReport>,
    pub issues: Vec<EquipmentIssue>,
    pub ratings: Vec<MoraleRating>,
    pub ledger: Vec<Hold>,
    pub legacy_routes: Vec<LegacyRoute>,
}

/// A snapshot stored as a JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file.
    pub fn load(&self) -> Result<Snapshot, SnapshotError> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| SnapshotError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&json).map_err(|e| SnapshotError::Json {
            message: e.to_string(),
        })
    }

    /// Write the snapshot, creating parent directories as needed.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| SnapshotError::Io {
                path: parent.to_path_buf(),
                message: format!("failed to create directory: {e}"),
            })?;
        }

        let json = serde_json::to_string_pretty(snapshot).map_err(|e| SnapshotError::Json {
            message: e.to_string(),
        })?;

        std::fs::write(&self.path, json).map_err(|e| SnapshotError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}
