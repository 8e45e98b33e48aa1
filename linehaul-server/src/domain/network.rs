//! Terminals, route templates and the mileage data attached to them.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{LegacyRouteId, TemplateCode, TemplateId, TerminalCode, TimeOfDay};

/// A terminal (location) in the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub code: TerminalCode,
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Terminal {
    /// Latitude/longitude pair, if both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// A reusable terminal pair and schedule that trips are created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTemplate {
    pub id: TemplateId,
    pub code: TemplateCode,
    pub origin: TerminalCode,
    pub destination: TerminalCode,
    #[serde(default)]
    pub departure: Option<TimeOfDay>,
    #[serde(default)]
    pub arrival: Option<TimeOfDay>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub transit_minutes: Option<u32>,
    pub active: bool,
}

impl RouteTemplate {
    /// Planned departure and arrival instants for a trip dispatched on `date`.
    ///
    /// Arrival uses the transit duration when known, otherwise the scheduled
    /// arrival time, rolled to the next day when it falls before departure.
    pub fn planned_times(
        &self,
        date: NaiveDate,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let Some(departure) = self.departure else {
            return (None, None);
        };
        let depart_at = date.and_time(departure.to_naive_time()).and_utc();

        let arrive_at = match (self.transit_minutes, self.arrival) {
            (Some(mins), _) => Some(depart_at + Duration::minutes(mins as i64)),
            (None, Some(arrival)) => {
                let same_day = date.and_time(arrival.to_naive_time()).and_utc();
                if arrival < departure {
                    Some(same_day + Duration::days(1))
                } else {
                    Some(same_day)
                }
            }
            (None, None) => None,
        };

        (Some(depart_at), arrive_at)
    }
}

/// A curated origin/destination mileage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileageEntry {
    pub origin: TerminalCode,
    pub destination: TerminalCode,
    pub miles: f64,
    pub active: bool,
}

/// One leg of a historical named route.
///
/// Several rows may share a `name` when the journey connects through
/// intermediate terminals. Ordering metadata is filled in by the chain
/// reconstruction batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRoute {
    pub id: LegacyRouteId,
    pub name: String,
    pub origin: TerminalCode,
    pub destination: TerminalCode,
    #[serde(default)]
    pub departure: Option<TimeOfDay>,
    #[serde(default)]
    pub arrival: Option<TimeOfDay>,
    #[serde(default)]
    pub miles: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub leg_order: Option<u32>,
    #[serde(default)]
    pub day_offset: Option<u32>,
    #[serde(default)]
    pub is_multi_leg: Option<bool>,
}

fn default_true() -> bool {
    true
}
