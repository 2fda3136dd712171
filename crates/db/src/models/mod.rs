//! Row structs and DTOs for the history tables.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row and a create DTO for inserts.

pub mod audit;
pub mod change_record;
pub mod undo_entry;
