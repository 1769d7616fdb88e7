//! CreAItion API server library.
//!
//! Exposes config, state, error handling, the router and its handlers so
//! integration tests and the binary entrypoint build the same application.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
