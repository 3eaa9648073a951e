#![forbid(unsafe_code)]

//! The editing core: a text buffer, a cursor/selection, and an IME composition
//! session kept consistent under interleaved input events.
//!
//! Everything here is a pure state transition. Rendering and host lookups
//! (hit testing, native selection) live in `inscribe-web`; this crate only
//! reports what changed ([`Dirty`]) and what the host must do
//! ([`HostCommands`]).

pub mod buffer;
pub mod composition;
pub mod editor;

pub use buffer::{Cursor, TextBuffer};
pub use composition::{CompositionSession, SessionAction, SessionPhase, SessionSignal};
pub use editor::{Dirty, Editor, HostCommands, ModifierLatch, Outcome};
