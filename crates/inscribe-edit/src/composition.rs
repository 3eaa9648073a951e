#![forbid(unsafe_code)]

//! IME composition session.
//!
//! Platforms emit one redundant raw-input notification right after a
//! composition ends. Instead of an ad-hoc "just finished" flag, that window is
//! its own phase, [`SessionPhase::AwaitingEcho`], and every legal move is a row
//! of [`transition`]:
//!
//! | phase \ signal | Start | Update | End | Cancel | RawInput | Blur | Refocus |
//! |---|---|---|---|---|---|---|---|
//! | Idle | Composing, Begin | Idle | Idle | Idle | Idle, CommitRaw | Idle | Idle |
//! | Composing | Composing | Composing, SetComposing | AwaitingEcho, Commit | Idle, Discard | Composing | AwaitingEcho, Commit | Composing |
//! | AwaitingEcho | Composing, Begin | AwaitingEcho | AwaitingEcho | AwaitingEcho | Idle, SwallowEcho | AwaitingEcho | Idle |
//!
//! Cells without an action are [`SessionAction::Ignore`].
//!
//! Browsers blur the control before `compositionend` when the user clicks
//! elsewhere, so `Blur` commits what is composed instead of dropping it. The
//! late `End` then lands in `AwaitingEcho` and is ignored. A platform that sends
//! no echo for a blurred composition leaves that window open until `Refocus`
//! closes it, so the first keystroke after returning is not swallowed.

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Composing,
    /// Composition committed; the next raw input is the platform's echo of it.
    AwaitingEcho,
}

/// Input that drives the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionSignal {
    Start,
    Update,
    End,
    Cancel,
    /// The raw input control's value changed.
    RawInput,
    /// The raw input control lost focus.
    Blur,
    /// The raw input control regained focus.
    Refocus,
}

/// What the caller must do for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    Ignore,
    /// Cut the current selection out of the buffer; composition begins.
    Begin,
    /// Replace the composing text.
    SetComposing,
    /// Splice the composed text into the buffer.
    Commit,
    /// Drop the composing text without committing.
    Discard,
    /// Ordinary typing: commit the raw value.
    CommitRaw,
    /// Drop the raw value; it duplicates the last commit.
    SwallowEcho,
}

/// The session transition table.
#[must_use]
pub const fn transition(phase: SessionPhase, signal: SessionSignal) -> (SessionPhase, SessionAction) {
    use SessionAction as A;
    use SessionPhase as P;
    use SessionSignal as S;

    match (phase, signal) {
        (P::Idle, S::Start) => (P::Composing, A::Begin),
        (P::Idle, S::RawInput) => (P::Idle, A::CommitRaw),
        (P::Idle, S::Update | S::End | S::Cancel | S::Blur | S::Refocus) => (P::Idle, A::Ignore),

        (P::Composing, S::Start | S::RawInput | S::Refocus) => (P::Composing, A::Ignore),
        (P::Composing, S::Update) => (P::Composing, A::SetComposing),
        (P::Composing, S::End | S::Blur) => (P::AwaitingEcho, A::Commit),
        (P::Composing, S::Cancel) => (P::Idle, A::Discard),

        (P::AwaitingEcho, S::Start) => (P::Composing, A::Begin),
        (P::AwaitingEcho, S::RawInput) => (P::Idle, A::SwallowEcho),
        (P::AwaitingEcho, S::Refocus) => (P::Idle, A::Ignore),
        (P::AwaitingEcho, S::Update | S::End | S::Cancel | S::Blur) => {
            (P::AwaitingEcho, A::Ignore)
        }
    }
}

/// Composition state: the phase plus the transient composing text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionSession {
    phase: SessionPhase,
    composing_text: String,
}

impl CompositionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True between composition start and end.
    pub fn is_composing(&self) -> bool {
        self.phase == SessionPhase::Composing
    }

    /// Interim IME text; empty outside a composition.
    pub fn composing_text(&self) -> &str {
        &self.composing_text
    }

    /// Apply `signal` and return the action the caller must carry out.
    ///
    /// `data` is the IME payload for `Update`, and the optional final string
    /// for `End`; `Blur` commits the last update. [`Self::take_commit`] yields
    /// the committed text after a `Commit` action.
    pub fn apply(&mut self, signal: SessionSignal, data: Option<&str>) -> SessionAction {
        let (next, action) = transition(self.phase, signal);
        match action {
            SessionAction::Begin | SessionAction::Discard => self.composing_text.clear(),
            SessionAction::SetComposing => {
                self.composing_text.clear();
                self.composing_text.push_str(data.unwrap_or(""));
            }
            SessionAction::Commit => {
                // Prefer the platform's final string over the last interim update.
                if let Some(final_text) = data {
                    self.composing_text.clear();
                    self.composing_text.push_str(final_text);
                }
            }
            SessionAction::Ignore | SessionAction::CommitRaw | SessionAction::SwallowEcho => {}
        }
        self.phase = next;
        action
    }

    /// Take the text committed by the last `Commit`, leaving it empty.
    pub fn take_commit(&mut self) -> String {
        std::mem::take(&mut self.composing_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_swallows_exactly_one_echo() {
        let mut s = CompositionSession::new();
        assert_eq!(s.apply(SessionSignal::Start, None), SessionAction::Begin);
        assert_eq!(s.apply(SessionSignal::Update, Some("n")), SessionAction::SetComposing);
        assert_eq!(s.apply(SessionSignal::Update, Some("ni")), SessionAction::SetComposing);
        assert_eq!(s.composing_text(), "ni");
        assert_eq!(s.apply(SessionSignal::End, Some("你")), SessionAction::Commit);
        assert_eq!(s.take_commit(), "你");
        assert_eq!(s.phase(), SessionPhase::AwaitingEcho);

        assert_eq!(s.apply(SessionSignal::RawInput, None), SessionAction::SwallowEcho);
        assert_eq!(s.apply(SessionSignal::RawInput, None), SessionAction::CommitRaw);
    }

    #[test]
    fn end_without_payload_commits_last_update() {
        let mut s = CompositionSession::new();
        s.apply(SessionSignal::Start, None);
        s.apply(SessionSignal::Update, Some("Hi"));
        assert_eq!(s.apply(SessionSignal::End, None), SessionAction::Commit);
        assert_eq!(s.take_commit(), "Hi");
        assert_eq!(s.composing_text(), "");
    }

    #[test]
    fn nested_start_is_ignored() {
        let mut s = CompositionSession::new();
        s.apply(SessionSignal::Start, None);
        s.apply(SessionSignal::Update, Some("ka"));
        assert_eq!(s.apply(SessionSignal::Start, None), SessionAction::Ignore);
        assert_eq!(s.composing_text(), "ka");
    }

    #[test]
    fn stray_update_and_end_while_idle_are_ignored() {
        let mut s = CompositionSession::new();
        assert_eq!(s.apply(SessionSignal::Update, Some("x")), SessionAction::Ignore);
        assert_eq!(s.apply(SessionSignal::End, Some("x")), SessionAction::Ignore);
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.composing_text(), "");
    }

    #[test]
    fn cancel_discards() {
        let mut s = CompositionSession::new();
        s.apply(SessionSignal::Start, None);
        s.apply(SessionSignal::Update, Some("ka"));
        assert_eq!(s.apply(SessionSignal::Cancel, None), SessionAction::Discard);
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.composing_text(), "");
        // No echo is expected after a cancel.
        assert_eq!(s.apply(SessionSignal::RawInput, None), SessionAction::CommitRaw);
    }

    #[test]
    fn restart_before_echo_drops_the_echo_window() {
        let mut s = CompositionSession::new();
        s.apply(SessionSignal::Start, None);
        s.apply(SessionSignal::End, Some("a"));
        s.take_commit();
        assert_eq!(s.apply(SessionSignal::Start, None), SessionAction::Begin);
        assert!(s.is_composing());
    }

    #[test]
    fn raw_input_while_composing_belongs_to_the_ime() {
        let mut s = CompositionSession::new();
        s.apply(SessionSignal::Start, None);
        assert_eq!(s.apply(SessionSignal::RawInput, None), SessionAction::Ignore);
        assert!(s.is_composing());
    }

    #[test]
    fn blur_commits_and_late_end_is_ignored() {
        let mut s = CompositionSession::new();
        s.apply(SessionSignal::Start, None);
        s.apply(SessionSignal::Update, Some("ka"));
        assert_eq!(s.apply(SessionSignal::Blur, None), SessionAction::Commit);
        assert_eq!(s.take_commit(), "ka");
        assert_eq!(s.phase(), SessionPhase::AwaitingEcho);

        assert_eq!(s.apply(SessionSignal::End, Some("か")), SessionAction::Ignore);
        assert_eq!(s.composing_text(), "");
        assert_eq!(s.apply(SessionSignal::RawInput, None), SessionAction::SwallowEcho);
    }

    #[test]
    fn refocus_closes_an_unanswered_echo_window() {
        let mut s = CompositionSession::new();
        s.apply(SessionSignal::Start, None);
        s.apply(SessionSignal::Blur, None);
        s.take_commit();
        assert_eq!(s.apply(SessionSignal::Refocus, None), SessionAction::Ignore);
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.apply(SessionSignal::RawInput, None), SessionAction::CommitRaw);
    }

    #[test]
    fn focus_signals_outside_a_composition_are_inert() {
        let mut s = CompositionSession::new();
        assert_eq!(s.apply(SessionSignal::Blur, None), SessionAction::Ignore);
        assert_eq!(s.apply(SessionSignal::Refocus, None), SessionAction::Ignore);
        assert_eq!(s.phase(), SessionPhase::Idle);

        s.apply(SessionSignal::Start, None);
        assert_eq!(s.apply(SessionSignal::Refocus, None), SessionAction::Ignore);
        assert!(s.is_composing());
    }
}
