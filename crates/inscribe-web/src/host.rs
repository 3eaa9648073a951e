#![forbid(unsafe_code)]

//! Host adapter: one editor, one presentation.
//!
//! [`EditorHost`] is the only writer of the presentation. Every dispatched event
//! runs the core transition to completion, then repaints exactly what the core
//! reported dirty: [`Dirty::TEXT`] rebuilds the text spans and the overlay,
//! [`Dirty::CURSOR`] the overlay alone.

use inscribe_core::config::EditorConfig;
use inscribe_core::event::{InputEvent, MouseInput, MousePhase, NodeId, SelectionInput};
use inscribe_core::geometry::{Point, Rect};
use inscribe_edit::{Dirty, Editor, HostCommands, Outcome};

use crate::overlay::Overlay;
use crate::presentation::{Presentation, TextContent};

/// The editor wired to a presentation layer.
#[derive(Debug)]
pub struct EditorHost<P> {
    editor: Editor,
    presentation: P,
    /// Node holding the buffer text; `None` while composing.
    text_node: Option<NodeId>,
    fallback_caret_height: f32,
    overlay: Option<Overlay>,
}

impl<P: Presentation> EditorHost<P> {
    /// Seed an editor from `config` and paint it.
    pub fn new(config: &EditorConfig, presentation: P) -> Self {
        let mut host = Self {
            editor: Editor::new(config),
            presentation,
            text_node: None,
            fallback_caret_height: config.fallback_caret_height,
            overlay: None,
        };
        host.render();
        host
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Mutable access for host-side layout changes (resize, scroll).
    ///
    /// Call [`Self::render_cursor`] afterwards to re-place the overlay.
    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// The managed text node, if the buffer is currently rendered as one.
    pub fn text_node(&self) -> Option<NodeId> {
        self.text_node
    }

    /// Last overlay painted.
    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    /// Deliver one host event and return the commands the host must run.
    pub fn dispatch(&mut self, event: &InputEvent) -> HostCommands {
        let _span = inscribe_core::debug_span!("host.dispatch", kind = event.kind()).entered();

        let outcome = match event {
            InputEvent::Mouse(mouse) => self.route_mouse(mouse),
            InputEvent::Selection(selection) => self.route_selection(selection),
            other => self.editor.handle(other),
        };
        self.apply(outcome)
    }

    /// Repaint everything from scratch.
    pub fn render(&mut self) {
        self.render_text();
        self.render_cursor();
    }

    /// Recompute and paint the caret/selection overlay.
    pub fn render_cursor(&mut self) -> Overlay {
        let origin = self.presentation.container_rect();
        let cursor = self.editor.cursor();
        let composing = self.editor.is_composing();

        let target = if composing {
            self.presentation.composition_rect()
        } else if let Some(node) = self.text_node {
            self.presentation
                .range_rect(node, cursor.index, cursor.end())
        } else {
            Rect::default()
        };

        let overlay = Overlay::compute(
            origin,
            target,
            composing || cursor.is_caret(),
            self.fallback_caret_height,
        );
        self.presentation.render_overlay(&overlay);
        self.overlay = Some(overlay);
        overlay
    }

    fn render_text(&mut self) {
        let content = text_content(&self.editor);
        self.text_node = self.presentation.render_text(&content);
    }

    fn apply(&mut self, outcome: Outcome) -> HostCommands {
        if outcome.dirty.contains(Dirty::TEXT) {
            self.render_text();
        }
        if outcome.dirty.intersects(Dirty::TEXT | Dirty::CURSOR) {
            self.render_cursor();
        }
        outcome.commands
    }

    fn route_mouse(&mut self, mouse: &MouseInput) -> Outcome {
        match mouse.phase {
            MousePhase::Down if !mouse.is_primary() => {
                inscribe_core::trace!(button = ?mouse.button, "secondary press ignored");
                Outcome::NONE
            }
            MousePhase::Down => {
                let point = Point::new(mouse.x, mouse.y);
                match self.presentation.caret_offset_at(point) {
                    Some(offset) => self.editor.place_caret(offset),
                    None => {
                        inscribe_core::debug!(x = mouse.x, y = mouse.y, "no caret position at point");
                        Outcome::NONE
                    }
                }
            }
            MousePhase::Up => self.editor.release_pointer(),
            MousePhase::Move => Outcome::NONE,
        }
    }

    fn route_selection(&mut self, selection: &SelectionInput) -> Outcome {
        match (selection.node, self.text_node) {
            (Some(reported), Some(managed)) if reported == managed => self
                .editor
                .apply_native_selection(selection.start, selection.end),
            _ => {
                inscribe_core::trace!(node = ?selection.node, "selection outside managed text");
                Outcome::NONE
            }
        }
    }
}

/// What the presentation should show for the editor's current state.
pub fn text_content(editor: &Editor) -> TextContent<'_> {
    if editor.is_composing() {
        let (pre, post) = editor.buffer().split_at_cursor();
        TextContent::Composing {
            pre,
            composing: editor.composing_text(),
            post,
        }
    } else {
        TextContent::Plain {
            text: editor.text(),
        }
    }
}
