//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the DTOs used for inserts.

pub mod recipe;
pub mod report;
pub mod site_settings;
