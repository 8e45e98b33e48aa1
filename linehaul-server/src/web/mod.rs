//! JSON web layer for trip dispatch.
//!
//! A thin adapter: handlers parse input, call the coordinator, mileage
//! resolver or chain runner, and map their errors onto HTTP statuses.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
