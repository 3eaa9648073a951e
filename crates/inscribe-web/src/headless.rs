#![forbid(unsafe_code)]

//! Deterministic monospace presentation.
//!
//! Every char is `char_width` pixels wide and the single line is `line_height`
//! tall. Each plain render mints a fresh node id, the way a DOM host creates a
//! new text node on every rebuild, so stale selection reports are detectable.

use inscribe_core::event::NodeId;
use inscribe_core::geometry::{Point, Rect};

use crate::overlay::Overlay;
use crate::presentation::{Presentation, TextContent};

/// Owned copy of the last rendered [`TextContent`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderedText {
    #[default]
    Nothing,
    Plain(String),
    Composing {
        pre: String,
        composing: String,
        post: String,
    },
}

impl RenderedText {
    /// Visible text with the composing span inlined.
    pub fn visible(&self) -> String {
        match self {
            Self::Nothing => String::new(),
            Self::Plain(text) => text.clone(),
            Self::Composing {
                pre,
                composing,
                post,
            } => format!("{pre}{composing}{post}"),
        }
    }
}

/// Headless layout engine for tests and replay.
#[derive(Debug, Clone)]
pub struct HeadlessPresentation {
    container: Rect,
    char_width: f32,
    line_height: f32,
    hit_testing: bool,
    next_node: u32,
    text_node: Option<NodeId>,
    rendered: RenderedText,
    /// Chars in the last render, composing text included.
    laid_out: usize,
    overlay: Option<Overlay>,
    text_renders: usize,
    overlay_renders: usize,
}

impl Default for HeadlessPresentation {
    fn default() -> Self {
        Self::new(Rect::new(0.0, 0.0, 640.0, 37.0), 18.0)
    }
}

impl HeadlessPresentation {
    /// A container at `container` with `char_width`-wide glyphs.
    ///
    /// The line height is the container height.
    pub fn new(container: Rect, char_width: f32) -> Self {
        Self {
            container,
            char_width,
            line_height: container.height,
            hit_testing: true,
            next_node: 1,
            text_node: None,
            rendered: RenderedText::Nothing,
            laid_out: 0,
            overlay: None,
            text_renders: 0,
            overlay_renders: 0,
        }
    }

    /// Emulate a host without caret hit-testing (builder).
    #[must_use]
    pub fn without_hit_testing(mut self) -> Self {
        self.hit_testing = false;
        self
    }

    /// Move the container (same size).
    pub fn move_container_to(&mut self, x: f32, y: f32) {
        self.container.x = x;
        self.container.y = y;
    }

    pub fn rendered(&self) -> &RenderedText {
        &self.rendered
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    /// Id of the current plain text node.
    pub fn text_node(&self) -> Option<NodeId> {
        self.text_node
    }

    pub fn text_renders(&self) -> usize {
        self.text_renders
    }

    pub fn overlay_renders(&self) -> usize {
        self.overlay_renders
    }

    /// Client point at the middle of the line, `offset` chars in.
    pub fn point_at_offset(&self, offset: usize) -> Point {
        Point::new(
            self.x_at(offset),
            self.container.y + self.line_height / 2.0,
        )
    }

    fn x_at(&self, offset: usize) -> f32 {
        self.container.x + offset as f32 * self.char_width
    }

    fn span(&self, start: usize, end: usize) -> Rect {
        Rect::new(
            self.x_at(start),
            self.container.y,
            end.saturating_sub(start) as f32 * self.char_width,
            self.line_height,
        )
    }
}

impl Presentation for HeadlessPresentation {
    fn render_text(&mut self, content: &TextContent<'_>) -> Option<NodeId> {
        self.text_renders += 1;
        self.laid_out = content.char_len();
        match *content {
            TextContent::Plain { text } => {
                let node = NodeId(self.next_node);
                self.next_node += 1;
                self.rendered = RenderedText::Plain(text.to_string());
                self.text_node = Some(node);
            }
            TextContent::Composing {
                pre,
                composing,
                post,
            } => {
                self.rendered = RenderedText::Composing {
                    pre: pre.to_string(),
                    composing: composing.to_string(),
                    post: post.to_string(),
                };
                self.text_node = None;
            }
        }
        self.text_node
    }

    fn container_rect(&self) -> Rect {
        self.container
    }

    fn range_rect(&self, node: NodeId, start: usize, end: usize) -> Rect {
        let RenderedText::Plain(text) = &self.rendered else {
            return Rect::default();
        };
        if self.text_node != Some(node) || text.is_empty() {
            return Rect::default();
        }
        self.span(start, end)
    }

    fn composition_rect(&self) -> Rect {
        match &self.rendered {
            RenderedText::Composing { pre, composing, .. } => {
                let start = pre.chars().count();
                self.span(start, start + composing.chars().count())
            }
            _ => Rect::default(),
        }
    }

    fn render_overlay(&mut self, overlay: &Overlay) {
        self.overlay_renders += 1;
        self.overlay = Some(*overlay);
    }

    fn caret_offset_at(&self, point: Point) -> Option<usize> {
        if !self.hit_testing {
            return None;
        }
        let rel = ((point.x - self.container.x) / self.char_width).round();
        if rel <= 0.0 {
            return Some(0);
        }
        Some((rel as usize).min(self.laid_out))
    }
}
