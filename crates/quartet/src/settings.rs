//! Compiler settings.

use serde::{Deserialize, Serialize};

/// Whether compiled validators collect explanations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Boolean-only validators; every built-in node is pure.
    #[default]
    Fast,
    /// Built-in nodes carry error handlers and record explanations.
    Explain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub mode: Mode,
    /// Indent unit (in spaces) used when rendering validator source.
    pub indent: usize,
    /// Share one deferred sub-validator between clones of the same variant
    /// within a compilation unit.
    pub cache_variants: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Fast,
            indent: 2,
            cache_variants: true,
        }
    }
}

impl Settings {
    pub fn explain() -> Self {
        Self {
            mode: Mode::Explain,
            ..Default::default()
        }
    }

    pub fn is_explain(&self) -> bool {
        self.mode == Mode::Explain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"mode": "explain"}"#).unwrap();
        assert_eq!(
            settings,
            Settings {
                mode: Mode::Explain,
                indent: 2,
                cache_variants: true,
            }
        );
    }

    #[test]
    fn test_settings_kebab_case() {
        let settings: Settings =
            serde_json::from_str(r#"{"indent": 4, "cache-variants": false}"#).unwrap();
        assert_eq!(settings.mode, Mode::Fast);
        assert_eq!(settings.indent, 4);
        assert!(!settings.cache_variants);
        assert!(Settings::explain().is_explain());
    }
}
