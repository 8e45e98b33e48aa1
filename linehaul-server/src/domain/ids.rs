//! Numeric row identifiers.
//!
//! Ids come from the store's sequences. They are never reused, so gaps are
//! normal after rolled-back transactions.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(TripId);
id_type!(TemplateId);
id_type!(DriverId);
id_type!(
    /// Trucks, trailers and dollies share one id space.
    EquipmentId
);
id_type!(LoadsheetId);
id_type!(ReportId);
id_type!(IssueId);
id_type!(RatingId);
id_type!(LegacyRouteId);
