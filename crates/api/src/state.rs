use std::sync::Arc;

use roomdesigner_pipeline::GenerationService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Task API over the generation pipeline.
    pub generation: Arc<GenerationService>,
}
