#![forbid(unsafe_code)]

//! Normalized, JSON-friendly host input schema.
//!
//! The host (JS glue or a native shell) is expected to provide:
//! - DOM `key`/`code` strings for keyboard events (normalized here into [`KeyCode`]),
//! - client-space pixel coordinates for pointer events,
//! - char offsets (not UTF-16 units) for native selection reports.
//!
//! Every event has a stable JSON form (see [`InputEventJson`]) so sessions can be
//! recorded and replayed.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held during an input event.
    ///
    /// Encoded as a compact `u8` bitset in JSON (`mods`).
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

impl Modifiers {
    #[must_use]
    pub const fn from_bits_truncate_u8(bits: u8) -> Self {
        Self::from_bits_truncate(bits)
    }
}

/// Phase for key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPhase {
    Down,
    Up,
}

/// Phase for pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MousePhase {
    Down,
    Up,
    Move,
}

/// Phase for IME composition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionPhase {
    Start,
    Update,
    /// Final commit for the current composition session.
    ///
    /// The serialized form remains `"end"` to match DOM event naming.
    End,
    Cancel,
}

/// Normalized key code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Backspace,
    Delete,
    Enter,
    Escape,
    Tab,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
    Shift,
    Control,
    Alt,
    Meta,
    Unidentified { key: Box<str>, code: Box<str> },
}

impl KeyCode {
    /// The modifier bit this key drives, if it is a modifier key.
    #[must_use]
    pub const fn modifier(&self) -> Option<Modifiers> {
        match self {
            Self::Shift => Some(Modifiers::SHIFT),
            Self::Control => Some(Modifiers::CTRL),
            Self::Alt => Some(Modifiers::ALT),
            Self::Meta => Some(Modifiers::META),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_code_string(&self) -> String {
        match self {
            Self::Char(c) => c.to_string(),
            Self::Backspace => "Backspace".to_string(),
            Self::Delete => "Delete".to_string(),
            Self::Enter => "Enter".to_string(),
            Self::Escape => "Escape".to_string(),
            Self::Tab => "Tab".to_string(),
            Self::Home => "Home".to_string(),
            Self::End => "End".to_string(),
            Self::Up => "Up".to_string(),
            Self::Down => "Down".to_string(),
            Self::Left => "Left".to_string(),
            Self::Right => "Right".to_string(),
            Self::Shift => "Shift".to_string(),
            Self::Control => "Control".to_string(),
            Self::Alt => "Alt".to_string(),
            Self::Meta => "Meta".to_string(),
            Self::Unidentified { .. } => "Unidentified".to_string(),
        }
    }

    /// Decode a JSON `code`.
    ///
    /// Accepts the normalized names produced by [`Self::to_code_string`]. Any
    /// other name (a DOM `key` such as `"ArrowLeft"`, or `"Unidentified"`) is
    /// resolved by [`normalize_dom_key_code`] from `raw_key`/`raw_code`, with
    /// `code` standing in for a missing `raw_key`.
    #[must_use]
    pub fn from_code_string(code: &str, raw_key: Option<&str>, raw_code: Option<&str>) -> Self {
        match code {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Escape" => Self::Escape,
            "Tab" => Self::Tab,
            "Home" => Self::Home,
            "End" => Self::End,
            "Up" => Self::Up,
            "Down" => Self::Down,
            "Left" => Self::Left,
            "Right" => Self::Right,
            "Shift" => Self::Shift,
            "Control" => Self::Control,
            "Alt" => Self::Alt,
            "Meta" => Self::Meta,
            _ => {
                let mut chars = code.chars();
                match (chars.next(), chars.next()) {
                    (Some(first), None) => Self::Char(first),
                    _ => normalize_dom_key_code(raw_key.unwrap_or(code), raw_code.unwrap_or("")),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other(u8),
}

impl MouseButton {
    /// The button that places the caret.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        matches!(self, Self::Left)
    }

    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
            Self::Other(n) => n,
        }
    }

    #[must_use]
    pub const fn from_u8(n: u8) -> Self {
        match n {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            other => Self::Other(other),
        }
    }
}

/// Identity of a host text node, as handed out by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Normalized key input event.
///
/// `mods` are the modifiers the host reports as held with this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub phase: KeyPhase,
    pub code: KeyCode,
    pub mods: Modifiers,
}

impl KeyInput {
    /// A key-down with no modifiers.
    #[must_use]
    pub fn down(code: KeyCode) -> Self {
        Self {
            phase: KeyPhase::Down,
            code,
            mods: Modifiers::empty(),
        }
    }

    /// A key-up with no modifiers.
    #[must_use]
    pub fn up(code: KeyCode) -> Self {
        Self {
            phase: KeyPhase::Up,
            ..Self::down(code)
        }
    }

    /// Add held modifiers (builder).
    #[must_use]
    pub fn with_mods(mut self, mods: Modifiers) -> Self {
        self.mods = mods;
        self
    }
}

/// Pointer event in client coordinates.
///
/// `button` is `None` when the host does not report one (treated as primary).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseInput {
    pub phase: MousePhase,
    pub button: Option<MouseButton>,
    pub x: f32,
    pub y: f32,
}

impl MouseInput {
    /// A button-less pointer event at `(x, y)`.
    #[must_use]
    pub const fn at(phase: MousePhase, x: f32, y: f32) -> Self {
        Self {
            phase,
            button: None,
            x,
            y,
        }
    }

    /// Set the button (builder).
    #[must_use]
    pub const fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    /// Whether this event comes from the caret-placing button.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.button.is_none_or(MouseButton::is_primary)
    }
}

/// IME composition event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositionInput {
    pub phase: CompositionPhase,
    pub data: Option<Box<str>>,
}

/// The hidden input control's value changed (typing or paste, outside IME).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextInput {
    pub value: Box<str>,
}

/// The host document's native selection changed.
///
/// `node` is the selection's start container, when it is a text node the
/// presentation layer knows about. Offsets are in chars within that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionInput {
    pub node: Option<NodeId>,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusInput {
    pub focused: bool,
}

/// Normalized host input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyInput),
    Mouse(MouseInput),
    Composition(CompositionInput),
    Text(TextInput),
    Selection(SelectionInput),
    Focus(FocusInput),
}

impl InputEvent {
    /// Short, stable name of the event kind (matches the JSON `kind` tag).
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::Mouse(_) => "mouse",
            Self::Composition(_) => "composition",
            Self::Text(_) => "text",
            Self::Selection(_) => "selection",
            Self::Focus(_) => "focus",
        }
    }

    /// Shorthand for a composition event.
    #[must_use]
    pub fn composition(phase: CompositionPhase, data: Option<&str>) -> Self {
        Self::Composition(CompositionInput {
            phase,
            data: data.map(Into::into),
        })
    }

    /// Shorthand for a raw input-value event.
    #[must_use]
    pub fn text(value: &str) -> Self {
        Self::Text(TextInput {
            value: value.into(),
        })
    }
}

/// Deterministic normalization of DOM key/code strings into a [`KeyCode`].
#[must_use]
pub fn normalize_dom_key_code(dom_key: &str, dom_code: &str) -> KeyCode {
    // Modifier keys first: their `key` is a full word, their `code` carries a side.
    if let Some(code) = modifier_from_dom(dom_key).or_else(|| modifier_from_dom(dom_code)) {
        return code;
    }

    // Prefer the logical `key` for printable characters (already includes shift).
    let mut chars = dom_key.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        return KeyCode::Char(first);
    }

    match dom_key {
        "Backspace" => KeyCode::Backspace,
        "Delete" => KeyCode::Delete,
        "Enter" => KeyCode::Enter,
        "Escape" | "Esc" => KeyCode::Escape,
        "Tab" => KeyCode::Tab,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "ArrowUp" => KeyCode::Up,
        "ArrowDown" => KeyCode::Down,
        "ArrowLeft" => KeyCode::Left,
        "ArrowRight" => KeyCode::Right,
        "Spacebar" => KeyCode::Char(' '),
        _ => key_code_from_dom_code(dom_code).unwrap_or_else(|| KeyCode::Unidentified {
            key: dom_key.into(),
            code: dom_code.into(),
        }),
    }
}

fn modifier_from_dom(s: &str) -> Option<KeyCode> {
    Some(match s {
        "Shift" | "ShiftLeft" | "ShiftRight" => KeyCode::Shift,
        "Control" | "ControlLeft" | "ControlRight" => KeyCode::Control,
        "Alt" | "AltLeft" | "AltRight" => KeyCode::Alt,
        "Meta" | "MetaLeft" | "MetaRight" | "OSLeft" | "OSRight" => KeyCode::Meta,
        _ => return None,
    })
}

fn key_code_from_dom_code(dom_code: &str) -> Option<KeyCode> {
    // Physical letter keys (`KeyA`) survive layouts that report an empty `key`.
    if let Some(letter) = dom_code.strip_prefix("Key") {
        let mut chars = letter.chars();
        if let (Some(c), None) = (chars.next(), chars.next())
            && c.is_ascii_alphabetic()
        {
            return Some(KeyCode::Char(c.to_ascii_lowercase()));
        }
    }
    Some(match dom_code {
        "Backspace" => KeyCode::Backspace,
        "Delete" => KeyCode::Delete,
        "Enter" | "NumpadEnter" => KeyCode::Enter,
        "Escape" => KeyCode::Escape,
        "Tab" => KeyCode::Tab,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "ArrowUp" => KeyCode::Up,
        "ArrowDown" => KeyCode::Down,
        "ArrowLeft" => KeyCode::Left,
        "ArrowRight" => KeyCode::Right,
        _ => return None,
    })
}

/// JSON encoding used for session traces and the wasm surface.
///
/// A `kind` tag plus the minimum semantic fields needed for replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEventJson {
    Key {
        phase: KeyPhase,
        code: String,
        #[serde(default)]
        mods: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_code: Option<String>,
    },
    Mouse {
        phase: MousePhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        button: Option<u8>,
        x: f32,
        y: f32,
    },
    Composition {
        phase: CompositionPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
    Text {
        value: String,
    },
    Selection {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<NodeId>,
        start: usize,
        end: usize,
    },
    Focus {
        focused: bool,
    },
}

impl InputEvent {
    /// Encode this event as a stable JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&InputEventJson::from(self))
    }

    /// Decode a previously encoded event JSON string.
    ///
    /// Errors occur if the JSON does not match the schema.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let json: InputEventJson = serde_json::from_str(s)?;
        Ok(Self::from(json))
    }
}

impl From<&InputEvent> for InputEventJson {
    fn from(value: &InputEvent) -> Self {
        match value {
            InputEvent::Key(key) => {
                let (code, raw_key, raw_code) = match &key.code {
                    KeyCode::Unidentified { key, code } => (
                        "Unidentified".to_string(),
                        Some(key.to_string()),
                        Some(code.to_string()),
                    ),
                    other => (other.to_code_string(), None, None),
                };
                Self::Key {
                    phase: key.phase,
                    code,
                    mods: key.mods.bits(),
                    raw_key,
                    raw_code,
                }
            }
            InputEvent::Mouse(mouse) => Self::Mouse {
                phase: mouse.phase,
                button: mouse.button.map(MouseButton::to_u8),
                x: mouse.x,
                y: mouse.y,
            },
            InputEvent::Composition(comp) => Self::Composition {
                phase: comp.phase,
                data: comp.data.as_deref().map(str::to_string),
            },
            InputEvent::Text(text) => Self::Text {
                value: text.value.to_string(),
            },
            InputEvent::Selection(sel) => Self::Selection {
                node: sel.node,
                start: sel.start,
                end: sel.end,
            },
            InputEvent::Focus(f) => Self::Focus { focused: f.focused },
        }
    }
}

impl From<InputEventJson> for InputEvent {
    fn from(value: InputEventJson) -> Self {
        match value {
            InputEventJson::Key {
                phase,
                code,
                mods,
                raw_key,
                raw_code,
            } => Self::Key(KeyInput {
                phase,
                code: KeyCode::from_code_string(&code, raw_key.as_deref(), raw_code.as_deref()),
                mods: Modifiers::from_bits_truncate_u8(mods),
            }),
            InputEventJson::Mouse {
                phase,
                button,
                x,
                y,
            } => Self::Mouse(MouseInput {
                phase,
                button: button.map(MouseButton::from_u8),
                x,
                y,
            }),
            InputEventJson::Composition { phase, data } => Self::Composition(CompositionInput {
                phase,
                data: data.map(Into::into),
            }),
            InputEventJson::Text { value } => Self::Text(TextInput {
                value: value.into(),
            }),
            InputEventJson::Selection { node, start, end } => {
                Self::Selection(SelectionInput { node, start, end })
            }
            InputEventJson::Focus { focused } => Self::Focus(FocusInput { focused }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dom_modifier_keys_normalize_from_key_or_code() {
        assert_eq!(normalize_dom_key_code("Control", "ControlLeft"), KeyCode::Control);
        assert_eq!(normalize_dom_key_code("", "ControlRight"), KeyCode::Control);
        assert_eq!(normalize_dom_key_code("Meta", "MetaLeft"), KeyCode::Meta);
        assert_eq!(KeyCode::Control.modifier(), Some(Modifiers::CTRL));
        assert_eq!(KeyCode::Char('a').modifier(), None);
    }

    #[test]
    fn dom_navigation_and_editing_keys() {
        assert_eq!(normalize_dom_key_code("Backspace", "Backspace"), KeyCode::Backspace);
        assert_eq!(normalize_dom_key_code("ArrowLeft", "ArrowLeft"), KeyCode::Left);
        assert_eq!(normalize_dom_key_code("ArrowRight", "ArrowRight"), KeyCode::Right);
        assert_eq!(normalize_dom_key_code("a", "KeyA"), KeyCode::Char('a'));
    }

    #[test]
    fn dom_code_fallback_for_letters() {
        // Some IMEs report `key: "Process"` while composing.
        assert_eq!(normalize_dom_key_code("Unknown", "KeyA"), KeyCode::Char('a'));
        assert_eq!(
            normalize_dom_key_code("Process", "Digit1"),
            KeyCode::Unidentified {
                key: "Process".into(),
                code: "Digit1".into(),
            }
        );
    }

    #[test]
    fn json_uses_kind_tag() {
        let event = InputEvent::composition(CompositionPhase::End, Some("你好"));
        let json = event.to_json_string().unwrap();
        assert_eq!(json, r#"{"kind":"composition","phase":"end","data":"你好"}"#);
        assert_eq!(InputEvent::from_json_str(&json).unwrap(), event);
    }

    #[test]
    fn json_accepts_dom_key_names() {
        let left = InputEvent::from_json_str(r#"{"kind":"key","phase":"down","code":"ArrowLeft"}"#)
            .unwrap();
        assert_eq!(left, InputEvent::Key(KeyInput::down(KeyCode::Left)));

        let ctrl = InputEvent::from_json_str(
            r#"{"kind":"key","phase":"down","code":"Unidentified","raw_key":"Control","raw_code":"ControlLeft"}"#,
        )
        .unwrap();
        assert_eq!(ctrl, InputEvent::Key(KeyInput::down(KeyCode::Control)));

        let side = InputEvent::from_json_str(r#"{"kind":"key","phase":"up","code":"ControlLeft"}"#)
            .unwrap();
        assert_eq!(side, InputEvent::Key(KeyInput::up(KeyCode::Control)));

        let letter = InputEvent::from_json_str(
            r#"{"kind":"key","phase":"down","code":"Process","raw_code":"KeyA"}"#,
        )
        .unwrap();
        assert_eq!(letter, InputEvent::Key(KeyInput::down(KeyCode::Char('a'))));
    }

    #[test]
    fn json_mouse_button_is_optional() {
        let plain = InputEvent::from_json_str(r#"{"kind":"mouse","phase":"down","x":4.0,"y":2.0}"#)
            .unwrap();
        let InputEvent::Mouse(plain) = plain else {
            panic!("expected a mouse event");
        };
        assert!(plain.is_primary());

        let right = InputEvent::from_json_str(
            r#"{"kind":"mouse","phase":"down","button":2,"x":4.0,"y":2.0}"#,
        )
        .unwrap();
        assert_eq!(
            right,
            InputEvent::Mouse(MouseInput::at(MousePhase::Down, 4.0, 2.0).with_button(MouseButton::Right))
        );
    }

    #[test]
    fn json_key_defaults_mods() {
        let event = InputEvent::from_json_str(r#"{"kind":"key","phase":"down","code":"Left"}"#)
            .unwrap();
        assert_eq!(event, InputEvent::Key(KeyInput::down(KeyCode::Left)));
    }

    #[test]
    fn json_selection_without_node() {
        let event =
            InputEvent::from_json_str(r#"{"kind":"selection","start":1,"end":4}"#).unwrap();
        assert_eq!(
            event,
            InputEvent::Selection(SelectionInput {
                node: None,
                start: 1,
                end: 4,
            })
        );
    }

    #[test]
    fn json_rejects_unknown_kind() {
        assert!(InputEvent::from_json_str(r#"{"kind":"wheel","dx":1}"#).is_err());
    }

    #[test]
    fn unidentified_key_roundtrips_raw_strings() {
        let event = InputEvent::Key(KeyInput::down(KeyCode::Unidentified {
            key: "Process".into(),
            code: "".into(),
        }));
        let json = event.to_json_string().unwrap();
        assert_eq!(InputEvent::from_json_str(&json).unwrap(), event);
    }
}
