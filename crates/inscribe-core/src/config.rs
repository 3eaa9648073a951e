#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! The widget starts from a fixed seed (text plus caret) and needs one visual
//! metric of its own: the caret height used when the host cannot measure the
//! text (an empty buffer has no glyph box to measure).
//!
//! Sources, lowest to highest precedence at the call site's discretion:
//! [`EditorConfig::default`], [`EditorConfig::from_json_str`] (wasm init
//! options), and [`EditorConfig::from_env`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::event::Modifiers;

/// Seed text shown at startup.
pub const DEFAULT_SEED_TEXT: &str = "Hello world";
/// Seed caret position (char offset).
pub const DEFAULT_SEED_CARET: usize = 3;
/// Font size of the text container, in pixels.
pub const DEFAULT_FONT_SIZE: f32 = 32.0;

/// Modifier that arms the select-all chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordModifier {
    #[default]
    Ctrl,
    Meta,
    Alt,
}

impl ChordModifier {
    #[must_use]
    pub const fn modifiers(self) -> Modifiers {
        match self {
            Self::Ctrl => Modifiers::CTRL,
            Self::Meta => Modifiers::META,
            Self::Alt => Modifiers::ALT,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Self::Ctrl),
            "meta" | "cmd" | "super" => Some(Self::Meta),
            "alt" | "option" => Some(Self::Alt),
            _ => None,
        }
    }
}

/// Configuration for an editor instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Initial buffer contents.
    pub seed_text: String,
    /// Initial caret offset; clamped to the seed text length.
    pub seed_caret: usize,
    /// Height of the line caret when the host returns empty geometry.
    pub fallback_caret_height: f32,
    /// Modifier latched for the select-all chord.
    pub select_all_modifier: ChordModifier,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            seed_text: DEFAULT_SEED_TEXT.to_string(),
            seed_caret: DEFAULT_SEED_CARET,
            fallback_caret_height: DEFAULT_FONT_SIZE,
            select_all_modifier: ChordModifier::Ctrl,
        }
    }
}

impl EditorConfig {
    /// Set the seed text (builder).
    #[must_use]
    pub fn with_seed_text(mut self, text: impl Into<String>) -> Self {
        self.seed_text = text.into();
        self
    }

    /// Set the seed caret (builder).
    #[must_use]
    pub fn with_seed_caret(mut self, caret: usize) -> Self {
        self.seed_caret = caret;
        self
    }

    /// Set the fallback caret height (builder).
    #[must_use]
    pub fn with_fallback_caret_height(mut self, height: f32) -> Self {
        self.fallback_caret_height = height;
        self
    }

    /// Set the select-all modifier (builder).
    #[must_use]
    pub fn with_select_all_modifier(mut self, modifier: ChordModifier) -> Self {
        self.select_all_modifier = modifier;
        self
    }

    /// Seed caret clamped into the seed text.
    #[must_use]
    pub fn clamped_seed_caret(&self) -> usize {
        self.seed_caret.min(self.seed_text.chars().count())
    }

    /// Parse JSON options; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read overrides from `INSCRIBE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`, which maps a variable name to its value.
    ///
    /// Recognized names: `INSCRIBE_SEED_TEXT`, `INSCRIBE_SEED_CARET`,
    /// `INSCRIBE_CARET_HEIGHT`, `INSCRIBE_SELECT_ALL_MODIFIER`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(text) = lookup(ENV_SEED_TEXT) {
            config.seed_text = text;
        }
        if let Some(raw) = lookup(ENV_SEED_CARET) {
            config.seed_caret = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::invalid(ENV_SEED_CARET, &raw, "expected a char offset"))?;
        }
        if let Some(raw) = lookup(ENV_CARET_HEIGHT) {
            config.fallback_caret_height = raw
                .trim()
                .parse::<f32>()
                .map_err(|_| ConfigError::invalid(ENV_CARET_HEIGHT, &raw, "expected pixels"))?;
        }
        if let Some(raw) = lookup(ENV_SELECT_ALL_MODIFIER) {
            config.select_all_modifier = ChordModifier::parse(&raw).ok_or_else(|| {
                ConfigError::invalid(ENV_SELECT_ALL_MODIFIER, &raw, "expected ctrl, meta or alt")
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let height = self.fallback_caret_height;
        if !height.is_finite() || height <= 0.0 {
            return Err(ConfigError::invalid(
                "fallback_caret_height",
                &height.to_string(),
                "must be a positive number of pixels",
            ));
        }
        Ok(())
    }
}

const ENV_SEED_TEXT: &str = "INSCRIBE_SEED_TEXT";
const ENV_SEED_CARET: &str = "INSCRIBE_SEED_CARET";
const ENV_CARET_HEIGHT: &str = "INSCRIBE_CARET_HEIGHT";
const ENV_SELECT_ALL_MODIFIER: &str = "INSCRIBE_SELECT_ALL_MODIFIER";

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// A setting had a value that could not be used.
    Invalid {
        setting: &'static str,
        value: String,
        reason: &'static str,
    },
    /// JSON options did not match the schema.
    Json(serde_json::Error),
}

impl ConfigError {
    fn invalid(setting: &'static str, value: &str, reason: &'static str) -> Self {
        Self::Invalid {
            setting,
            value: value.to_string(),
            reason,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid {
                setting,
                value,
                reason,
            } => write!(f, "invalid {setting}={value:?}: {reason}"),
            Self::Json(err) => write!(f, "invalid editor options: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn defaults_match_the_demo_seed() {
        let config = EditorConfig::default();
        assert_eq!(config.seed_text, "Hello world");
        assert_eq!(config.seed_caret, 3);
        assert_eq!(config.fallback_caret_height, 32.0);
        assert_eq!(config.select_all_modifier.modifiers(), Modifiers::CTRL);
    }

    #[test]
    fn empty_environment_is_default() {
        let config = EditorConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn from_env_reads_the_process_environment() {
        let from_process = EditorConfig::from_env();
        let expected = EditorConfig::from_lookup(|name| std::env::var(name).ok());
        match (from_process, expected) {
            (Ok(config), Ok(expected)) => assert_eq!(config, expected),
            (Err(err), Err(expected)) => assert_eq!(err.to_string(), expected.to_string()),
            (got, want) => panic!("from_env {got:?} disagrees with the environment {want:?}"),
        }
    }

    #[test]
    fn environment_overrides() {
        let config = EditorConfig::from_lookup(lookup_from(&[
            ("INSCRIBE_SEED_TEXT", "abc"),
            ("INSCRIBE_SEED_CARET", " 1 "),
            ("INSCRIBE_CARET_HEIGHT", "18.5"),
            ("INSCRIBE_SELECT_ALL_MODIFIER", "Meta"),
        ]))
        .unwrap();
        assert_eq!(config.seed_text, "abc");
        assert_eq!(config.seed_caret, 1);
        assert_eq!(config.fallback_caret_height, 18.5);
        assert_eq!(config.select_all_modifier, ChordModifier::Meta);
    }

    #[test]
    fn bad_caret_is_reported_with_setting_name() {
        let err = EditorConfig::from_lookup(lookup_from(&[("INSCRIBE_SEED_CARET", "-2")]))
            .unwrap_err();
        assert!(err.to_string().contains("INSCRIBE_SEED_CARET"));
    }

    #[test]
    fn non_positive_caret_height_is_rejected() {
        let err = EditorConfig::from_lookup(lookup_from(&[("INSCRIBE_CARET_HEIGHT", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn json_options_fill_missing_fields() {
        let config = EditorConfig::from_json_str(r#"{"seed_text":"xy","select_all_modifier":"meta"}"#)
            .unwrap();
        assert_eq!(config.seed_text, "xy");
        assert_eq!(config.seed_caret, DEFAULT_SEED_CARET);
        assert_eq!(config.clamped_seed_caret(), 2);
        assert_eq!(config.select_all_modifier, ChordModifier::Meta);
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let err = EditorConfig::from_json_str(r#"{"theme":"dark"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
