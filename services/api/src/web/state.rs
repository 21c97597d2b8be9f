//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use draftforge_core::ports::{DatabaseService, TextGenerationService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// Everything a handler needs from configuration is baked into the adapters at
/// startup, so the state carries only the two service ports.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub generator: Arc<dyn TextGenerationService>,
}
