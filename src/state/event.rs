use crate::theme::ThemePreference;

/// Something that may move the stored preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceEvent {
    /// Value loaded from storage at startup.
    Load(ThemePreference),
    Cycle,
    Set(ThemePreference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceTransition {
    pub from: ThemePreference,
    pub event: PreferenceEvent,
    pub to: ThemePreference,
}

impl PreferenceTransition {
    pub const fn new(from: ThemePreference, event: PreferenceEvent, to: ThemePreference) -> Self {
        Self { from, event, to }
    }
}
