#![forbid(unsafe_code)]

//! Core: geometry, the normalized host input schema, configuration, and logging.
//!
//! Nothing in this crate touches editing state. It defines the vocabulary that
//! `inscribe-edit` (the state machine) and `inscribe-web` (the bridge to a
//! presentation layer) share.

pub mod config;
pub mod event;
pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, trace_span, warn};
