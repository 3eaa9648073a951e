#![forbid(unsafe_code)]

//! Caret and selection overlay geometry.
//!
//! Pure functions of the rectangles the presentation layer reports, so the same
//! state always paints the same overlay.

use inscribe_core::geometry::Rect;
use serde::Serialize;

/// What to draw over (or under) the text, relative to the text container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    /// Thin line cursor; its top-left at `(x, y)`.
    Caret { x: f32, y: f32, height: f32 },
    /// Block highlight under the selected range.
    Selection(Rect),
}

impl Overlay {
    /// Compute the overlay for `target` inside `origin`.
    ///
    /// With `line_caret` the caret sits on the right edge of `target` (the end of
    /// the composing span, or a collapsed range). A target with no height means
    /// the host could not measure anything (empty buffer, unmeasured text); a
    /// caret then falls back to the container's top-left with `fallback_height`,
    /// whatever the cursor covers.
    #[must_use]
    pub fn compute(origin: Rect, target: Rect, line_caret: bool, fallback_height: f32) -> Self {
        if target.has_no_height() {
            return Self::Caret {
                x: 0.0,
                y: 0.0,
                height: fallback_height,
            };
        }
        if !line_caret {
            return Self::Selection(target.relative_to(&origin));
        }
        Self::Caret {
            x: target.right() - origin.left(),
            y: target.top() - origin.top(),
            height: target.height,
        }
    }

    #[must_use]
    pub const fn is_caret(&self) -> bool {
        matches!(self, Self::Caret { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ORIGIN: Rect = Rect::new(100.0, 40.0, 400.0, 37.0);

    #[test]
    fn caret_at_right_edge_of_collapsed_range() {
        let target = Rect::new(157.0, 42.0, 0.0, 37.0);
        assert_eq!(
            Overlay::compute(ORIGIN, target, true, 32.0),
            Overlay::Caret {
                x: 57.0,
                y: 2.0,
                height: 37.0,
            }
        );
    }

    #[test]
    fn caret_after_composing_span() {
        let span = Rect::new(157.0, 40.0, 64.0, 37.0);
        assert_eq!(
            Overlay::compute(ORIGIN, span, true, 32.0),
            Overlay::Caret {
                x: 121.0,
                y: 0.0,
                height: 37.0,
            }
        );
    }

    #[test]
    fn empty_geometry_falls_back_to_font_height() {
        assert_eq!(
            Overlay::compute(ORIGIN, Rect::default(), true, 32.0),
            Overlay::Caret {
                x: 0.0,
                y: 0.0,
                height: 32.0,
            }
        );
    }

    #[test]
    fn unmeasured_selection_falls_back_to_caret() {
        assert_eq!(
            Overlay::compute(ORIGIN, Rect::default(), false, 32.0),
            Overlay::Caret {
                x: 0.0,
                y: 0.0,
                height: 32.0,
            }
        );
    }

    #[test]
    fn selection_is_container_relative() {
        let target = Rect::new(100.0, 40.0, 90.0, 37.0);
        assert_eq!(
            Overlay::compute(ORIGIN, target, false, 32.0),
            Overlay::Selection(Rect::new(0.0, 0.0, 90.0, 37.0))
        );
    }

    #[test]
    fn overlay_json_is_tagged() {
        let json = serde_json::to_string(&Overlay::Selection(Rect::new(1.0, 2.0, 3.0, 4.0)))
            .unwrap();
        assert_eq!(
            json,
            r#"{"kind":"selection","x":1.0,"y":2.0,"width":3.0,"height":4.0}"#
        );
    }
}
