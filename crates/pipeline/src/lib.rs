//! Generation-job orchestration.
//!
//! Tasks are created through [`GenerationService`], which applies the
//! [`AdmissionGate`](admission::AdmissionGate) and persists a `pending` row.
//! A single background [`Poller`] then advances every active task one stage
//! per iteration through the task processor, which talks to the remote job
//! service and hands finished results to a [`ResultPostProcessor`].

pub mod admission;
pub mod config;
pub mod error;
pub mod poller;
pub mod post_process;
mod processor;
pub mod service;

pub use config::GenerationConfig;
pub use error::GenerationError;
pub use poller::{Poller, TickReport};
pub use post_process::{ModelFileWriter, ResultPostProcessor};
pub use service::{GenerationService, TaskListing};
