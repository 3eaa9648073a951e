#![forbid(unsafe_code)]

//! Input event router.
//!
//! [`Editor`] owns the buffer, the composition session and the modifier latch,
//! and turns normalized host events into state transitions. Each handler
//! returns an [`Outcome`]: what needs repainting and which commands the host
//! must run (focus the hidden input, clear its raw value, cancel the default
//! action of a key).

use bitflags::bitflags;
use inscribe_core::config::EditorConfig;
use inscribe_core::event::{
    CompositionInput, CompositionPhase, InputEvent, KeyCode, KeyInput, KeyPhase, Modifiers,
    MousePhase,
};

use crate::buffer::{Cursor, TextBuffer};
use crate::composition::{CompositionSession, SessionAction, SessionPhase, SessionSignal};

bitflags! {
    /// Parts of the presentation invalidated by a transition.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Dirty: u8 {
        /// Text spans must be rebuilt (implies the overlay too).
        const TEXT   = 0b01;
        /// Only the caret/selection overlay moved.
        const CURSOR = 0b10;
    }
}

bitflags! {
    /// Commands for the input/focus layer. Encoded as a `u8` for the wasm surface.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HostCommands: u8 {
        /// Return focus to the hidden editable control.
        const FOCUS_INPUT     = 0b001;
        /// Reset the hidden control's pending value to empty.
        const CLEAR_RAW_VALUE = 0b010;
        /// Cancel the key's default action (and stop propagation).
        const PREVENT_DEFAULT = 0b100;
    }
}

/// Result of handling one event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub struct Outcome {
    pub dirty: Dirty,
    pub commands: HostCommands,
}

impl Outcome {
    /// Nothing changed, nothing to do.
    pub const NONE: Self = Self {
        dirty: Dirty::empty(),
        commands: HostCommands::empty(),
    };

    pub const fn redraw(dirty: Dirty) -> Self {
        Self {
            dirty,
            commands: HostCommands::empty(),
        }
    }

    pub const fn command(commands: HostCommands) -> Self {
        Self {
            dirty: Dirty::empty(),
            commands,
        }
    }

    /// Redraw text and overlay.
    const fn text_changed() -> Self {
        Self::redraw(Dirty::TEXT.union(Dirty::CURSOR))
    }

    /// Redraw the overlay when `changed`.
    const fn cursor_moved(changed: bool) -> Self {
        if changed {
            Self::redraw(Dirty::CURSOR)
        } else {
            Self::NONE
        }
    }

    pub const fn with(self, commands: HostCommands) -> Self {
        Self {
            dirty: self.dirty,
            commands: self.commands.union(commands),
        }
    }

    pub const fn is_none(&self) -> bool {
        self.dirty.is_empty() && self.commands.is_empty()
    }
}

/// Held-modifier latch: set on the modifier's key-down, cleared on its key-up.
///
/// Focus loss clears everything so a modifier released outside the window
/// cannot stay stuck.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModifierLatch {
    held: Modifiers,
}

impl ModifierLatch {
    #[must_use]
    pub const fn held(&self) -> Modifiers {
        self.held
    }

    #[must_use]
    pub const fn is_held(&self, modifier: Modifiers) -> bool {
        self.held.contains(modifier)
    }

    pub fn press(&mut self, modifier: Modifiers) {
        self.held.insert(modifier);
    }

    pub fn release(&mut self, modifier: Modifiers) {
        self.held.remove(modifier);
    }

    pub fn clear(&mut self) {
        self.held = Modifiers::empty();
    }
}

/// The editing state machine.
#[derive(Debug, Clone)]
pub struct Editor {
    buffer: TextBuffer,
    session: CompositionSession,
    latch: ModifierLatch,
    select_all_modifier: Modifiers,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor seeded from `config`.
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            buffer: TextBuffer::new(config.seed_text.clone(), config.clamped_seed_caret()),
            session: CompositionSession::new(),
            latch: ModifierLatch::default(),
            select_all_modifier: config.select_all_modifier.modifiers(),
        }
    }

    /// Create an editor over `text` with a caret at `caret`.
    pub fn with_text(text: impl Into<String>, caret: usize) -> Self {
        Self {
            buffer: TextBuffer::new(text, caret),
            ..Self::default()
        }
    }

    // --- State access ---

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn cursor(&self) -> Cursor {
        self.buffer.cursor()
    }

    pub fn session(&self) -> &CompositionSession {
        &self.session
    }

    pub fn is_composing(&self) -> bool {
        self.session.is_composing()
    }

    pub fn composing_text(&self) -> &str {
        self.session.composing_text()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.latch.held()
    }

    /// Select `cursor` directly (test and host setup helper).
    ///
    /// Ignored while composing or when out of range.
    pub fn select(&mut self, cursor: Cursor) -> Outcome {
        self.apply_native_selection(cursor.index, cursor.end())
    }

    // --- Event handling ---

    /// Handle an event that needs no presentation lookup.
    ///
    /// Pointer presses and native selection reports carry host coordinates or
    /// node identities; the bridge resolves those and calls [`Self::place_caret`]
    /// or [`Self::apply_native_selection`]. Here they are ignored.
    pub fn handle(&mut self, event: &InputEvent) -> Outcome {
        match event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Composition(comp) => self.handle_composition(comp),
            InputEvent::Text(text) => self.handle_text(&text.value),
            InputEvent::Focus(focus) => self.handle_focus(focus.focused),
            InputEvent::Mouse(mouse) if mouse.phase == MousePhase::Up => self.release_pointer(),
            InputEvent::Mouse(_) | InputEvent::Selection(_) => Outcome::NONE,
        }
    }

    /// Handle a key-down or key-up.
    pub fn handle_key(&mut self, key: &KeyInput) -> Outcome {
        let _span = inscribe_core::debug_span!("editor.key", code = ?key.code, phase = ?key.phase)
            .entered();

        if let Some(modifier) = key.code.modifier() {
            match key.phase {
                KeyPhase::Down => self.latch.press(modifier),
                KeyPhase::Up => self.latch.release(modifier),
            }
            return Outcome::NONE;
        }
        if key.phase == KeyPhase::Up {
            return Outcome::NONE;
        }

        if self.session.is_composing() {
            // The composition owns the caret; everything else goes to the IME.
            return match key.code {
                KeyCode::Left | KeyCode::Right => {
                    inscribe_core::trace!("navigation suppressed while composing");
                    Outcome::command(HostCommands::PREVENT_DEFAULT)
                }
                _ => Outcome::NONE,
            };
        }

        let cursor = self.buffer.cursor();
        match key.code {
            KeyCode::Backspace => {
                if self.buffer.delete_backward() {
                    Outcome::text_changed()
                } else {
                    Outcome::NONE
                }
            }
            KeyCode::Left if cursor.is_caret() && cursor.index > 0 => {
                Outcome::cursor_moved(self.buffer.move_left())
            }
            KeyCode::Right if cursor.is_caret() && cursor.index < self.buffer.len() => {
                Outcome::cursor_moved(self.buffer.move_right())
            }
            KeyCode::Char('a' | 'A') if self.chord_held(key) => {
                Outcome::cursor_moved(self.buffer.select_all())
            }
            _ => Outcome::NONE,
        }
    }

    /// The select-all modifier is latched or reported with the key itself.
    fn chord_held(&self, key: &KeyInput) -> bool {
        self.latch.is_held(self.select_all_modifier) || key.mods.contains(self.select_all_modifier)
    }

    /// Handle an IME composition event.
    pub fn handle_composition(&mut self, comp: &CompositionInput) -> Outcome {
        let signal = match comp.phase {
            CompositionPhase::Start => SessionSignal::Start,
            CompositionPhase::Update => SessionSignal::Update,
            CompositionPhase::End => SessionSignal::End,
            CompositionPhase::Cancel => SessionSignal::Cancel,
        };
        self.drive_session(signal, comp.data.as_deref())
    }

    /// Handle a change of the hidden control's raw value (typing, paste).
    pub fn handle_text(&mut self, value: &str) -> Outcome {
        let _span = inscribe_core::debug_span!("editor.text", len = value.len()).entered();

        match self.session.apply(SessionSignal::RawInput, None) {
            SessionAction::CommitRaw if value.is_empty() => Outcome::NONE,
            SessionAction::CommitRaw => {
                self.buffer.replace(self.buffer.cursor(), value);
                Outcome::text_changed().with(HostCommands::CLEAR_RAW_VALUE)
            }
            SessionAction::SwallowEcho => {
                inscribe_core::debug!("post-composition echo swallowed");
                Outcome::command(HostCommands::CLEAR_RAW_VALUE)
            }
            _ => Outcome::NONE,
        }
    }

    /// Put the caret at a resolved pointer offset.
    pub fn place_caret(&mut self, offset: usize) -> Outcome {
        if self.session.is_composing() {
            inscribe_core::trace!(offset, "caret placement ignored while composing");
            return Outcome::NONE;
        }
        Outcome::cursor_moved(self.buffer.place_caret(offset))
    }

    /// Pointer released over the text: hand focus back to the hidden control.
    pub fn release_pointer(&mut self) -> Outcome {
        Outcome::command(HostCommands::FOCUS_INPUT)
    }

    /// Adopt a native selection already known to be inside the managed text.
    pub fn apply_native_selection(&mut self, start: usize, end: usize) -> Outcome {
        if self.session.is_composing() {
            return Outcome::NONE;
        }
        let changed = self.buffer.set_selection(start, end);
        if !changed {
            inscribe_core::trace!(start, end, "native selection ignored");
        }
        Outcome::cursor_moved(changed)
    }

    /// Focus gained or lost by the hidden control.
    ///
    /// Losing focus clears the modifier latch and commits an active
    /// composition as it stands.
    pub fn handle_focus(&mut self, focused: bool) -> Outcome {
        if focused {
            return self.drive_session(SessionSignal::Refocus, None);
        }
        self.latch.clear();
        self.drive_session(SessionSignal::Blur, None)
    }

    fn drive_session(&mut self, signal: SessionSignal, data: Option<&str>) -> Outcome {
        let action = self.session.apply(signal, data);
        inscribe_core::debug!(?signal, ?action, phase = ?self.session.phase(), "composition");

        match action {
            SessionAction::Begin => {
                // Cut the selection so the composition overlays a bare caret.
                self.buffer.replace(self.buffer.cursor(), "");
                Outcome::text_changed()
            }
            SessionAction::SetComposing => Outcome::text_changed(),
            SessionAction::Commit => {
                let committed = self.session.take_commit();
                let at = Cursor::caret(self.buffer.cursor().index);
                self.buffer.replace(at, &committed);
                debug_assert_eq!(self.session.phase(), SessionPhase::AwaitingEcho);
                Outcome::text_changed().with(HostCommands::CLEAR_RAW_VALUE)
            }
            SessionAction::Discard => Outcome::text_changed().with(HostCommands::CLEAR_RAW_VALUE),
            SessionAction::Ignore | SessionAction::CommitRaw | SessionAction::SwallowEcho => {
                Outcome::NONE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyInput {
        KeyInput::down(code)
    }

    fn comp(phase: CompositionPhase, data: Option<&str>) -> CompositionInput {
        CompositionInput {
            phase,
            data: data.map(Into::into),
        }
    }

    #[test]
    fn default_editor_uses_demo_seed() {
        let editor = Editor::default();
        assert_eq!(editor.text(), "Hello world");
        assert_eq!(editor.cursor(), Cursor::caret(3));
    }

    #[test]
    fn backspace_reports_text_dirty() {
        let mut editor = Editor::default();
        let out = editor.handle_key(&key(KeyCode::Backspace));
        assert_eq!(out.dirty, Dirty::TEXT | Dirty::CURSOR);
        assert_eq!(editor.text(), "Helo world");
    }

    #[test]
    fn arrows_gated_on_selection() {
        let mut editor = Editor::default();
        let _ = editor.select(Cursor::new(1, 3));
        assert!(editor.handle_key(&key(KeyCode::Left)).is_none());
        assert!(editor.handle_key(&key(KeyCode::Right)).is_none());
        assert_eq!(editor.cursor(), Cursor::new(1, 3));
    }

    #[test]
    fn modifier_latch_arms_select_all() {
        let mut editor = Editor::default();
        assert!(editor.handle_key(&key(KeyCode::Char('a'))).is_none());

        let _ = editor.handle_key(&key(KeyCode::Control));
        assert_eq!(editor.modifiers(), Modifiers::CTRL);
        let out = editor.handle_key(&key(KeyCode::Char('a')));
        assert_eq!(out.dirty, Dirty::CURSOR);
        assert_eq!(editor.cursor(), Cursor::new(0, 11));

        let _ = editor.handle_key(&KeyInput::up(KeyCode::Control));
        assert_eq!(editor.modifiers(), Modifiers::empty());
    }

    #[test]
    fn select_all_modifier_is_configurable() {
        let config = EditorConfig::default()
            .with_select_all_modifier(inscribe_core::config::ChordModifier::Meta);
        let mut editor = Editor::new(&config);
        let _ = editor.handle_key(&key(KeyCode::Control));
        let _ = editor.handle_key(&key(KeyCode::Char('a')));
        assert_eq!(editor.cursor(), Cursor::caret(3));

        let _ = editor.handle_key(&key(KeyCode::Meta));
        let _ = editor.handle_key(&key(KeyCode::Char('a')));
        assert_eq!(editor.cursor(), Cursor::new(0, 11));
    }

    #[test]
    fn text_commit_replaces_selection_and_clears_raw_value() {
        let mut editor = Editor::default();
        let _ = editor.select(Cursor::new(0, 5));
        let out = editor.handle_text("Howdy");
        assert_eq!(editor.text(), "Howdy world");
        assert_eq!(editor.cursor(), Cursor::caret(5));
        assert!(out.commands.contains(HostCommands::CLEAR_RAW_VALUE));
    }

    #[test]
    fn empty_raw_value_is_noop() {
        let mut editor = Editor::default();
        let _ = editor.select(Cursor::new(0, 5));
        assert!(editor.handle_text("").is_none());
        assert_eq!(editor.text(), "Hello world");
    }

    #[test]
    fn navigation_suppressed_while_composing() {
        let mut editor = Editor::default();
        let _ = editor.handle_composition(&comp(CompositionPhase::Start, None));
        let out = editor.handle_key(&key(KeyCode::Left));
        assert_eq!(out, Outcome::command(HostCommands::PREVENT_DEFAULT));
        assert!(editor.handle_key(&key(KeyCode::Backspace)).is_none());
        assert_eq!(editor.cursor(), Cursor::caret(3));
        assert_eq!(editor.text(), "Hello world");
    }

    #[test]
    fn control_latch_tracked_while_composing() {
        let mut editor = Editor::default();
        let _ = editor.handle_composition(&comp(CompositionPhase::Start, None));
        let _ = editor.handle_key(&key(KeyCode::Control));
        assert!(editor.modifiers().contains(Modifiers::CTRL));
    }

    #[test]
    fn composition_commits_once() {
        let mut editor = Editor::default();
        let _ = editor.select(Cursor::new(0, 5));

        let _ = editor.handle_composition(&comp(CompositionPhase::Start, None));
        assert_eq!(editor.text(), " world");
        assert_eq!(editor.cursor(), Cursor::caret(0));

        let _ = editor.handle_composition(&comp(CompositionPhase::Update, Some("Hi")));
        assert_eq!(editor.text().chars().count(), 6);
        assert_eq!(editor.composing_text(), "Hi");

        let out = editor.handle_composition(&comp(CompositionPhase::End, Some("Hi")));
        assert!(out.commands.contains(HostCommands::CLEAR_RAW_VALUE));
        assert_eq!(editor.text(), "Hi world");
        assert_eq!(editor.cursor(), Cursor::caret(2));

        let echo = editor.handle_text("Hi");
        assert_eq!(echo, Outcome::command(HostCommands::CLEAR_RAW_VALUE));
        assert_eq!(editor.text(), "Hi world");
    }

    #[test]
    fn pointer_ignored_while_composing() {
        let mut editor = Editor::default();
        let _ = editor.handle_composition(&comp(CompositionPhase::Start, None));
        assert!(editor.place_caret(0).is_none());
        assert_eq!(editor.release_pointer().commands, HostCommands::FOCUS_INPUT);
    }

    #[test]
    fn focus_loss_commits_composition_and_clears_latch() {
        let mut editor = Editor::default();
        let _ = editor.handle_key(&key(KeyCode::Control));
        let _ = editor.handle_composition(&comp(CompositionPhase::Start, None));
        let _ = editor.handle_composition(&comp(CompositionPhase::Update, Some("ka")));

        let out = editor.handle_focus(false);
        assert_eq!(out, Outcome::text_changed().with(HostCommands::CLEAR_RAW_VALUE));
        assert!(!editor.is_composing());
        assert_eq!(editor.modifiers(), Modifiers::empty());
        assert_eq!(editor.text(), "Helkalo world");
        assert_eq!(editor.cursor(), Cursor::caret(5));

        // The end that follows the blur must not commit a second time.
        assert!(editor.handle_composition(&comp(CompositionPhase::End, Some("ka"))).is_none());
        assert_eq!(editor.handle_text("ka"), Outcome::command(HostCommands::CLEAR_RAW_VALUE));
        assert_eq!(editor.text(), "Helkalo world");
    }

    #[test]
    fn refocus_without_echo_lets_typing_through() {
        let mut editor = Editor::default();
        let _ = editor.handle_composition(&comp(CompositionPhase::Start, None));
        let _ = editor.handle_composition(&comp(CompositionPhase::Update, Some("ka")));
        let _ = editor.handle_focus(false);

        assert!(editor.handle_focus(true).is_none());
        let _ = editor.handle_text("x");
        assert_eq!(editor.text(), "Helkaxlo world");
    }

    #[test]
    fn focus_changes_without_composition_repaint_nothing() {
        let mut editor = Editor::default();
        assert!(editor.handle_focus(false).is_none());
        assert!(editor.handle_focus(true).is_none());
        assert_eq!(editor.text(), "Hello world");
    }

    #[test]
    fn reported_modifier_arms_select_all_without_latch() {
        let mut editor = Editor::default();
        let plain = key(KeyCode::Char('a')).with_mods(Modifiers::SHIFT);
        assert!(editor.handle_key(&plain).is_none());

        let chord = key(KeyCode::Char('a')).with_mods(Modifiers::CTRL);
        assert_eq!(editor.handle_key(&chord).dirty, Dirty::CURSOR);
        assert_eq!(editor.cursor(), Cursor::new(0, 11));
        assert_eq!(editor.modifiers(), Modifiers::empty());
    }

    #[test]
    fn overflowing_selection_request_is_ignored() {
        let mut editor = Editor::default();
        assert!(editor.select(Cursor::new(usize::MAX, 1)).is_none());
        assert!(editor.select(Cursor::new(2, usize::MAX)).is_none());
        assert_eq!(editor.cursor(), Cursor::caret(3));
    }

    #[test]
    fn seed_caret_past_end_is_clamped() {
        let config = EditorConfig::default().with_seed_text("abc").with_seed_caret(99);
        let editor = Editor::new(&config);
        assert_eq!(editor.cursor(), Cursor::caret(3));
    }

    #[test]
    fn handle_routes_mouse_up_to_focus() {
        let mut editor = Editor::default();
        let up = InputEvent::Mouse(inscribe_core::event::MouseInput::at(MousePhase::Up, 0.0, 0.0));
        assert_eq!(editor.handle(&up).commands, HostCommands::FOCUS_INPUT);
    }
}
