//! Domain types for linehaul dispatch.
//!
//! Codes and times enforce their invariants at construction, so code that
//! receives these types can trust their validity. Entity records are plain
//! data; the rules for changing them live in [`crate::dispatch`].

mod fleet;
mod ids;
mod network;
mod records;
mod status;
mod template_code;
mod terminal;
mod time;
mod trip;
mod trip_number;

pub use fleet::{Driver, Equipment};
pub use ids::{
    DriverId, EquipmentId, IssueId, LegacyRouteId, LoadsheetId, RatingId, ReportId, TemplateId,
    TripId,
};
pub use network::{LegacyRoute, MileageEntry, RouteTemplate, Terminal};
pub use records::{DriverTripReport, EquipmentIssue, Loadsheet, MoraleRating};
pub use status::{DriverStatus, EquipmentKind, EquipmentStatus, TripStatus};
pub use template_code::{InvalidTemplateCode, TemplateCode};
pub(crate) use template_code::letter_prefix;
pub use terminal::{InvalidTerminalCode, TerminalCode};
pub use time::{TimeError, TimeOfDay};
pub use trip::{EquipmentSlot, Trip};
pub use trip_number::{InvalidTripNumber, TripNumber};
pub(crate) use trip_number::parse_sequence;
