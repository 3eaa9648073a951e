#![forbid(unsafe_code)]

//! The presentation seam.
//!
//! A presentation layer owns layout: it turns text into boxes and answers
//! geometry questions about them. The bridge only ever talks to it through
//! [`Presentation`].

use inscribe_core::event::NodeId;
use inscribe_core::geometry::{Point, Rect};
use serde::Serialize;

use crate::overlay::Overlay;

/// Text to lay out in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextContent<'a> {
    /// The buffer as a single text node.
    Plain { text: &'a str },
    /// Three adjacent spans; `composing` is tagged so it can be styled.
    Composing {
        pre: &'a str,
        composing: &'a str,
        post: &'a str,
    },
}

impl TextContent<'_> {
    /// Number of chars laid out, composing text included.
    pub fn char_len(&self) -> usize {
        match self {
            Self::Plain { text } => text.chars().count(),
            Self::Composing {
                pre,
                composing,
                post,
            } => pre.chars().count() + composing.chars().count() + post.chars().count(),
        }
    }
}

/// Layout engine operations used by the bridge.
///
/// Rectangles are in host (client) coordinates; the bridge converts them into
/// container-relative overlay geometry itself.
pub trait Presentation {
    /// Replace the container's children with `content`.
    ///
    /// Returns the id of the new text node for [`TextContent::Plain`], and
    /// `None` for composing content (which has no single managed node).
    fn render_text(&mut self, content: &TextContent<'_>) -> Option<NodeId>;

    /// Bounding box of the text container.
    fn container_rect(&self) -> Rect;

    /// Bounding box of the char range `[start, end)` of `node`.
    ///
    /// An empty text node yields a zero rectangle.
    fn range_rect(&self, node: NodeId, start: usize, end: usize) -> Rect;

    /// Bounding box of the composing span.
    fn composition_rect(&self) -> Rect;

    /// Replace the overlay layer with `overlay`.
    fn render_overlay(&mut self, overlay: &Overlay);

    /// Char offset of the caret position nearest to `point`.
    ///
    /// `None` when the host cannot hit-test or the point resolves to nothing.
    fn caret_offset_at(&self, point: Point) -> Option<usize>;
}
