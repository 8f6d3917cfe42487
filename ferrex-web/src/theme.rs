//! Theme preference and resolution
//!
//! The stored preference may be `auto`; both the server render and the
//! hydrated client turn it into a concrete [`Theme`] through the same
//! [`ThemeResolver`] so the first paint matches what hydration produces.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::cookie::find_cookie;

/// Request header carrying the browser's color scheme client hint
pub const COLOR_SCHEME_HINT_HEADER: &str = "sec-ch-prefers-color-scheme";

/// Stored theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    Auto,
}

impl ThemePreference {
    /// Lenient cookie decoding: anything unrecognised means `Auto`.
    pub fn from_cookie_value(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }
}

impl FromStr for ThemePreference {
    type Err = UnknownTheme;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "auto" | "system" => Ok(Self::Auto),
            other => Err(UnknownTheme(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(String);

/// Concrete theme a page renders with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// Parse a `Sec-CH-Prefers-Color-Scheme` value (`"light"`, `"dark"`,
    /// quoted or not).
    pub fn from_client_hint(value: &str) -> Option<Self> {
        match value.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_client_hint(value).ok_or_else(|| UnknownTheme(value.to_owned()))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait ThemeResolver: Send + Sync {
    fn resolve(&self, preference: ThemePreference) -> Theme;
}

/// Resolves `Auto` to the system scheme when known, else to a fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemThemeResolver {
    system: Option<Theme>,
    fallback: Theme,
}

impl SystemThemeResolver {
    pub fn new(fallback: Theme) -> Self {
        Self {
            system: None,
            fallback,
        }
    }

    pub fn with_system(mut self, system: Option<Theme>) -> Self {
        self.system = system;
        self
    }
}

impl ThemeResolver for SystemThemeResolver {
    fn resolve(&self, preference: ThemePreference) -> Theme {
        match preference {
            ThemePreference::Light => Theme::Light,
            ThemePreference::Dark => Theme::Dark,
            ThemePreference::Auto => self.system.unwrap_or(self.fallback),
        }
    }
}

/// Theme preference from the request cookies, `Auto` when absent.
pub fn read_theme_cookie(cookie_header: Option<&str>, name: &str) -> ThemePreference {
    cookie_header
        .and_then(|header| find_cookie(header, name))
        .map(ThemePreference::from_cookie_value)
        .unwrap_or_default()
}
