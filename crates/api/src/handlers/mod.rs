//! Request handlers.
//!
//! Handlers validate input, call the repositories in `creaition_db` and the
//! generation pipeline, and map failures via [`AppError`](crate::error::AppError).

pub mod character;
pub mod demo;
pub mod story;
pub mod upload;
pub mod user;
