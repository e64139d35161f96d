//! Application state for the API server

use crate::Pipeline;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; the pipeline clone shares its event channel and
/// configuration.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline used to start runs and subscribe to their events
    pub pipeline: Pipeline,
}

impl AppState {
    /// Create a new AppState
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}
