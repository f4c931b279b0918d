use roomdesigner_core::error::CoreError;
use roomdesigner_db::StoreError;

/// Errors returned by [`GenerationService`](crate::GenerationService).
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
