//! User preferences and the first-run flag.

use crate::constants::{IS_FIRST_TIME_KEY, LANGUAGE_KEY, THEME_KEY};
use crate::store::KeyValueStore;
use crate::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// UI language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    English,
    Arabic,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Arabic];

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
        }
    }

    /// Right-to-left script.
    pub fn is_rtl(self) -> bool {
        matches!(self, Language::Arabic)
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en" => Ok(Language::English),
            "ar" => Ok(Language::Arabic),
            other => Err(CoreError::InvalidInput(format!(
                "unsupported language {other:?} (expected en or ar)"
            ))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Colour theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
    #[default]
    System,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Dark, Theme::Light, Theme::System];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::System => "system",
        }
    }
}

impl FromStr for Theme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "system" => Ok(Theme::System),
            other => Err(CoreError::InvalidInput(format!(
                "unsupported theme {other:?} (expected dark, light or system)"
            ))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preference access over a [`KeyValueStore`].
///
/// Unknown stored values fall back to the defaults with a warning.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn language(&self) -> CoreResult<Language> {
        self.parsed(LANGUAGE_KEY)
    }

    pub fn set_language(&self, language: Language) -> CoreResult<()> {
        tracing::info!(%language, "language changed");
        self.store.set(LANGUAGE_KEY, language.code())
    }

    pub fn theme(&self) -> CoreResult<Theme> {
        self.parsed(THEME_KEY)
    }

    pub fn set_theme(&self, theme: Theme) -> CoreResult<()> {
        tracing::info!(%theme, "theme changed");
        self.store.set(THEME_KEY, theme.as_str())
    }

    /// True until onboarding has been completed. Defaults to true.
    pub fn is_first_time(&self) -> CoreResult<bool> {
        Ok(self
            .store
            .get(IS_FIRST_TIME_KEY)?
            .map_or(true, |v| v.trim() != "false"))
    }

    pub fn complete_onboarding(&self) -> CoreResult<()> {
        self.store.set(IS_FIRST_TIME_KEY, "false")
    }

    fn parsed<T>(&self, key: &str) -> CoreResult<T>
    where
        T: FromStr<Err = CoreError> + Default,
    {
        match self.store.get(key)? {
            None => Ok(T::default()),
            Some(raw) => Ok(raw.parse().unwrap_or_else(|e| {
                tracing::warn!(key, error = %e, "ignoring stored preference");
                T::default()
            })),
        }
    }
}
