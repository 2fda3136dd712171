//! Domain logic for reversible change tracking.
//!
//! This crate has no I/O dependencies so it can be shared by the
//! repository layer, the history services, and any future CLI tooling.

pub mod audit;
pub mod change;
pub mod error;
pub mod identifier;
pub mod retention;
pub mod snapshot;
pub mod types;
