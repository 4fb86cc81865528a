use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Earth,
    Neon,
    Vampire,
    Minimal,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Earth, Theme::Neon, Theme::Vampire, Theme::Minimal];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Earth => "earth",
            Theme::Neon => "neon",
            Theme::Vampire => "vampire",
            Theme::Minimal => "minimal",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ThemeError::ThemeNotFound(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Theme not found: {0}")]
    ThemeNotFound(String),
    #[error("Failed to write theme file: {0}")]
    WriteError(String),
}

#[derive(Serialize, Deserialize)]
struct StoredTheme {
    theme: Theme,
}

/// The active theme, loaded from its file once and written back on every change.
#[derive(Debug, Clone)]
pub struct ThemeContext {
    theme: Theme,
    path: PathBuf,
}

impl ThemeContext {
    /// A missing or unreadable file yields the default theme.
    pub fn init_from_storage(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let theme = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| toml::from_str::<StoredTheme>(&contents).ok())
            .map(|stored| stored.theme)
            .unwrap_or_default();
        Self { theme, path }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), ThemeError> {
        self.theme = theme;
        self.persist()
    }

    fn persist(&self) -> Result<(), ThemeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ThemeError::WriteError(e.to_string()))?;
        }
        let contents = toml::to_string(&StoredTheme { theme: self.theme })
            .map_err(|e| ThemeError::WriteError(e.to_string()))?;
        fs::write(&self.path, contents).map_err(|e| ThemeError::WriteError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_starts_on_default_theme() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ThemeContext::init_from_storage(dir.path().join("theme.toml"));
        assert_eq!(ctx.theme(), Theme::Earth);
    }

    #[test]
    fn set_theme_persists_across_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("theme.toml");

        let mut ctx = ThemeContext::init_from_storage(&path);
        ctx.set_theme(Theme::Vampire).unwrap();

        let reloaded = ThemeContext::init_from_storage(&path);
        assert_eq!(reloaded.theme(), Theme::Vampire);
    }

    #[test]
    fn garbage_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.toml");
        fs::write(&path, "theme = \"plaid\"").unwrap();
        assert_eq!(ThemeContext::init_from_storage(&path).theme(), Theme::Earth);
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("NEON".parse::<Theme>().unwrap(), Theme::Neon);
        assert!(matches!("plaid".parse::<Theme>(), Err(ThemeError::ThemeNotFound(_))));
    }
}
