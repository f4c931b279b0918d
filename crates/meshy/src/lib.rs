//! Meshy.ai image-to-3D client library.
//!
//! Provides the HTTP wrapper for the Meshy REST API, the classification of
//! every failure into retryable or permanent [`JobError`]s, and the
//! [`RemoteJobClient`] seam the generation pipeline drives.
//!
//! [`JobError`]: roomdesigner_core::error::JobError

pub mod api;
pub mod classify;
pub mod client;
pub mod config;
pub mod remote;

pub use client::MeshyClient;
pub use config::MeshyConfig;
pub use remote::{RemoteJobClient, RemoteJobState, RemoteJobStatus};
