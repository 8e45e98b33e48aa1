//! Linehaul trip dispatch server.
//!
//! Moves trips from planning through dispatch, transit and arrival while
//! keeping driver and equipment availability consistent, allocates trip
//! numbers, resolves terminal-to-terminal mileage and reconstructs the leg
//! order of legacy multi-leg routes.

pub mod cache;
pub mod chain;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod mileage;
pub mod store;
pub mod web;
