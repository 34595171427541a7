use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Built-in themes, in the order they are listed to users.
const BUILTIN_THEMES: &[(&str, ThemeName)] = &[
    ("catppuccin_latte", ThemeName::CatppuccinLatte),
    ("catppuccin_mocha", ThemeName::CatppuccinMocha),
    ("dracula", ThemeName::Dracula),
    ("github_dark", ThemeName::GithubDark),
    ("github_light", ThemeName::GithubLight),
    ("gruvbox_dark", ThemeName::GruvboxDark),
    ("gruvbox_light", ThemeName::GruvboxLight),
    ("monokai_pro", ThemeName::MonokaiPro),
    ("nord", ThemeName::Nord),
    ("solarized_dark", ThemeName::SolarizedDark),
    ("solarized_light", ThemeName::SolarizedLight),
    ("tokyo_night", ThemeName::TokyoNight),
];

#[derive(Debug, thiserror::Error)]
#[error("Unknown built-in theme '{name}'. Available: {available}")]
pub struct ThemeError {
    name: String,
    available: String,
}

/// Theme identifier passed to the render engine. It is part of the render
/// cache key, so the same text rendered under two themes never collides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ThemeName {
    CatppuccinLatte,
    CatppuccinMocha,
    Dracula,
    GithubDark,
    GithubLight,
    GruvboxDark,
    GruvboxLight,
    MonokaiPro,
    Nord,
    SolarizedDark,
    #[default]
    SolarizedLight,
    TokyoNight,
}

impl ThemeName {
    pub fn from_builtin(name: &str) -> Result<Self, ThemeError> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        BUILTIN_THEMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, theme)| *theme)
            .ok_or_else(|| ThemeError {
                name: name.to_string(),
                available: Self::list_builtins().join(", "),
            })
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_THEMES.iter().map(|(n, _)| *n).collect()
    }

    pub fn id(self) -> &'static str {
        BUILTIN_THEMES
            .iter()
            .find(|(_, theme)| *theme == self)
            .map(|(n, _)| *n)
            .unwrap_or("solarized_light")
    }

    pub fn is_dark(self) -> bool {
        matches!(
            self,
            Self::CatppuccinMocha
                | Self::Dracula
                | Self::GithubDark
                | Self::GruvboxDark
                | Self::MonokaiPro
                | Self::Nord
                | Self::SolarizedDark
                | Self::TokyoNight
        )
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ThemeName {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_builtin(s)
    }
}

impl TryFrom<String> for ThemeName {
    type Error = ThemeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_builtin(&value)
    }
}

impl From<ThemeName> for String {
    fn from(theme: ThemeName) -> Self {
        theme.id().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::ThemeName;

    #[test]
    fn from_builtin_accepts_hyphenated_and_case_insensitive_names() {
        let underscore = ThemeName::from_builtin("solarized_light").expect("underscore variant");
        let hyphen = ThemeName::from_builtin("Solarized-Light").expect("hyphen variant");
        assert_eq!(underscore, hyphen);
    }

    #[test]
    fn every_builtin_round_trips_through_its_id() {
        for name in ThemeName::list_builtins() {
            let theme = ThemeName::from_builtin(name).expect("builtin");
            assert_eq!(theme.id(), name);
        }
    }

    #[test]
    fn unknown_theme_lists_alternatives() {
        let err = ThemeName::from_builtin("neon").expect_err("unknown");
        let message = err.to_string();
        assert!(message.contains("neon"));
        assert!(message.contains("tokyo_night"));
    }

    #[test]
    fn default_is_light() {
        assert_eq!(ThemeName::default(), ThemeName::SolarizedLight);
        assert!(!ThemeName::default().is_dark());
        assert!(ThemeName::Nord.is_dark());
    }
}
