//! Domain building blocks shared by every CreAItion crate.
//!
//! Holds the error type, primitive aliases, story lifecycle and input
//! validation rules, and storage naming conventions.

pub mod error;
pub mod naming;
pub mod story;
pub mod types;
