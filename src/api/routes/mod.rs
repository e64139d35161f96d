//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`runs`] - Pipeline runs, streamed or summarized
//! - [`system`] - Greeting, health, config, events, OpenAPI

mod runs;
mod system;

// Re-export all handlers so `routes::function_name` works from the router
pub use runs::*;
pub use system::*;
