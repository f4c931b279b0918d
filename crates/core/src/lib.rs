//! Shared domain types for the RoomDesigner generation backend.
//!
//! Holds the identifier/timestamp aliases, the domain error taxonomy,
//! environment configuration helpers and the pure retry policy used by the
//! generation pipeline. Nothing in this crate performs network I/O.

pub mod config;
pub mod error;
pub mod retry;
pub mod types;
