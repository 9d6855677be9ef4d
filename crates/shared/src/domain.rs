use std::fmt;

use serde::{Deserialize, Serialize};

/// Storage key under which the theme preference is persisted.
pub const THEME_STORAGE_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Interprets a stored value. Only the exact string `dark` selects the dark
    /// theme; anything else, including a missing value, falls back to light.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Glyph shown on the toggle control while this theme is active.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Self::Light => "🌙",
            Self::Dark => "☀️",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_dark_value_selects_dark_theme() {
        assert_eq!(Theme::from_stored(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_stored(Some("light")), Theme::Light);
        assert_eq!(Theme::from_stored(Some("DARK")), Theme::Light);
        assert_eq!(Theme::from_stored(None), Theme::Light);
    }

    #[test]
    fn toggling_twice_restores_theme_and_icon() {
        let theme = Theme::default();
        assert_eq!(theme.toggled(), Theme::Dark);
        assert_ne!(theme.toggle_icon(), theme.toggled().toggle_icon());
        assert_eq!(theme.toggled().toggled(), theme);
    }
}
