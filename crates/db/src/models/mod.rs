//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Update DTOs where the table is edited after creation

pub mod character;
pub mod scene;
pub mod story;
pub mod user;
