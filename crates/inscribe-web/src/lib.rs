#![forbid(unsafe_code)]

//! Render/sync bridge for the inscribe text widget.
//!
//! The editing core (`inscribe-edit`) knows nothing about screens. This crate
//! connects it to a presentation layer:
//! - state → presentation: rebuild text spans and the caret/selection overlay
//!   whenever the core reports a change ([`host::EditorHost`]),
//! - presentation → state: resolve pointer presses to offsets and accept
//!   native selection reports that refer to the managed text node.
//!
//! [`headless::HeadlessPresentation`] is a deterministic monospace stand-in for
//! a real layout engine, used by tests and trace replay. On `wasm32` the
//! `InscribeWeb` type exposes the bridge to JS.

pub mod headless;
pub mod host;
pub mod overlay;
pub mod presentation;
pub mod session_record;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::InscribeWeb;

pub use host::EditorHost;
pub use overlay::Overlay;
pub use presentation::{Presentation, TextContent};
