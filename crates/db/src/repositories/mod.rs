//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod generation_task_repo;

pub use generation_task_repo::GenerationTaskRepo;
