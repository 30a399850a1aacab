use std::fmt;

use serde::{Deserialize, Serialize};

/// User-selected theme. `Auto` defers to the ambient color-scheme signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Auto,
    Light,
    Dark,
}

/// Concrete rendering mode written to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveMode {
    Light,
    Dark,
}

impl ThemePreference {
    /// Fixed cyclic order used by [`ThemePreference::next`].
    pub const ALL: [ThemePreference; 3] = [Self::Auto, Self::Light, Self::Dark];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Exact, case-sensitive match against the persisted spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pref| pref.as_str() == raw)
    }

    /// Like [`ThemePreference::parse`], but anything unrecognised becomes `Auto`.
    pub fn parse_lenient(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            tracing::debug!(raw, "unrecognised theme preference; using auto");
            Self::Auto
        })
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Auto => Self::Light,
            Self::Light => Self::Dark,
            Self::Dark => Self::Auto,
        }
    }

    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EffectiveMode {
    pub const fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for EffectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const fn resolve_effective_mode(preference: ThemePreference, prefers_dark: bool) -> EffectiveMode {
    match preference {
        ThemePreference::Auto => EffectiveMode::from_prefers_dark(prefers_dark),
        ThemePreference::Light => EffectiveMode::Light,
        ThemePreference::Dark => EffectiveMode::Dark,
    }
}

/// Toggle-button hint: which glyph to show and what its tooltip says.
///
/// Explicit preferences advertise the next step of the cycle; `Auto` reports
/// the mode it currently resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub glyph: &'static str,
    pub label: String,
}

impl Indicator {
    pub fn for_state(preference: ThemePreference, mode: EffectiveMode) -> Self {
        match preference {
            ThemePreference::Auto => Self {
                glyph: "fa-adjust",
                label: format!("Auto (currently {mode})"),
            },
            ThemePreference::Dark => Self {
                glyph: "fa-sun",
                label: "Switch to Auto".to_string(),
            },
            ThemePreference::Light => Self {
                glyph: "fa-moon",
                label: "Switch to Dark".to_string(),
            },
        }
    }
}
