#![forbid(unsafe_code)]

//! JS-facing surface.
//!
//! The page supplies a presentation object with these methods:
//!
//! | method | arguments | returns |
//! |---|---|---|
//! | `renderText` | JSON [`TextContent`] | node id (number) or `null` while composing |
//! | `containerRect` | | `{x, y, width, height}` |
//! | `rangeRect` | node, start, end | `{x, y, width, height}` |
//! | `compositionRect` | | `{x, y, width, height}` |
//! | `renderOverlay` | JSON [`Overlay`] | |
//! | `caretOffsetAt` | x, y | char offset or `null` |
//!
//! DOM listeners encode events as JSON and call [`InscribeWeb::input`], then
//! apply the returned command bits (focus, clear value, prevent default).
//!
//! Key events may forward the DOM strings as they are:
//! `{"kind":"key","phase":"down","code":e.key,"raw_key":e.key,"raw_code":e.code,"mods":bits}`
//! decodes `"ArrowLeft"`, `"ControlLeft"` or a layout-less `"KeyA"` the same
//! way the normalized names do. `mods` is optional (shift 1, alt 2, ctrl 4,
//! meta 8). Mouse `button` follows `MouseEvent.button`; only the primary
//! button places the caret.
//!
//! `blur` and `focus` on the hidden control map to `{"kind":"focus"}`. A blur
//! during a composition commits the composing text, so a `compositionend`
//! arriving after it changes nothing.

use inscribe_core::config::EditorConfig;
use inscribe_core::event::{InputEvent, NodeId};
use inscribe_core::geometry::{Point, Rect};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::host::EditorHost;
use crate::overlay::Overlay;
use crate::presentation::{Presentation, TextContent};

/// [`Presentation`] backed by a JS object.
#[derive(Debug)]
struct JsPresentation {
    target: JsValue,
}

impl JsPresentation {
    fn call(&self, method: &str, args: &Array) -> Option<JsValue> {
        let func = Reflect::get(&self.target, &JsValue::from_str(method))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        match func.apply(&self.target, args) {
            Ok(value) => Some(value),
            Err(err) => {
                inscribe_core::warn!(method, ?err, "presentation call failed");
                None
            }
        }
    }

    fn call_rect(&self, method: &str, args: &Array) -> Rect {
        self.call(method, args)
            .map_or_else(Rect::default, |value| rect_from_js(&value))
    }
}

fn rect_from_js(value: &JsValue) -> Rect {
    let field = |name: &str| {
        Reflect::get(value, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32
    };
    Rect::new(field("x"), field("y"), field("width"), field("height"))
}

fn offset_from_js(value: &JsValue) -> Option<usize> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as usize)
}

fn json_arg<T: serde::Serialize>(value: &T) -> Option<JsValue> {
    match serde_json::to_string(value) {
        Ok(json) => Some(JsValue::from_str(&json)),
        Err(err) => {
            inscribe_core::warn!(%err, "presentation payload encoding failed");
            None
        }
    }
}

impl Presentation for JsPresentation {
    fn render_text(&mut self, content: &TextContent<'_>) -> Option<NodeId> {
        let arg = json_arg(content)?;
        let node = self.call("renderText", &Array::of1(&arg))?;
        offset_from_js(&node).map(|id| NodeId(id as u32))
    }

    fn container_rect(&self) -> Rect {
        self.call_rect("containerRect", &Array::new())
    }

    fn range_rect(&self, node: NodeId, start: usize, end: usize) -> Rect {
        let args = Array::of3(
            &JsValue::from(node.0),
            &JsValue::from(start as u32),
            &JsValue::from(end as u32),
        );
        self.call_rect("rangeRect", &args)
    }

    fn composition_rect(&self) -> Rect {
        self.call_rect("compositionRect", &Array::new())
    }

    fn render_overlay(&mut self, overlay: &Overlay) {
        if let Some(arg) = json_arg(overlay) {
            let _ = self.call("renderOverlay", &Array::of1(&arg));
        }
    }

    fn caret_offset_at(&self, point: Point) -> Option<usize> {
        let args = Array::of2(&JsValue::from(point.x), &JsValue::from(point.y));
        offset_from_js(&self.call("caretOffsetAt", &args)?)
    }
}

/// Text widget bound to a JS presentation object.
#[wasm_bindgen]
pub struct InscribeWeb {
    host: EditorHost<JsPresentation>,
}

#[wasm_bindgen]
impl InscribeWeb {
    /// Create the widget and paint it.
    ///
    /// `options` is optional JSON editor configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(presentation: JsValue, options: Option<String>) -> Result<InscribeWeb, JsValue> {
        let config = match options.as_deref() {
            Some(json) => EditorConfig::from_json_str(json)
                .map_err(|err| JsValue::from_str(&err.to_string()))?,
            None => EditorConfig::default(),
        };
        let presentation = JsPresentation {
            target: presentation,
        };
        Ok(Self {
            host: EditorHost::new(&config, presentation),
        })
    }

    /// Dispatch one JSON-encoded event; returns the host command bits.
    pub fn input(&mut self, event_json: &str) -> Result<u8, JsValue> {
        let event = InputEvent::from_json_str(event_json)
            .map_err(|err| JsValue::from_str(&format!("invalid input event: {err}")))?;
        Ok(self.host.dispatch(&event).bits())
    }

    /// Current buffer text.
    pub fn text(&self) -> String {
        self.host.editor().text().to_string()
    }

    #[wasm_bindgen(js_name = cursorIndex)]
    pub fn cursor_index(&self) -> u32 {
        self.host.editor().cursor().index as u32
    }

    #[wasm_bindgen(js_name = cursorLength)]
    pub fn cursor_length(&self) -> u32 {
        self.host.editor().cursor().length as u32
    }

    #[wasm_bindgen(js_name = isComposing)]
    pub fn is_composing(&self) -> bool {
        self.host.editor().is_composing()
    }

    /// Repaint text and overlay.
    pub fn render(&mut self) {
        self.host.render();
    }

    /// Re-place the overlay after a layout change (resize, scroll).
    #[wasm_bindgen(js_name = renderCursor)]
    pub fn render_cursor(&mut self) {
        let _ = self.host.render_cursor();
    }
}
