use super::{PreferenceEvent, PreferenceTransition};
use crate::theme::ThemePreference;

/// Three states, one cyclic transition, no terminal state.
#[derive(Debug, Default)]
pub struct PreferenceMachine {
    state: ThemePreference,
    transition_history: Vec<PreferenceTransition>,
}

impl PreferenceMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ThemePreference {
        self.state
    }

    /// Every event is accepted from every state.
    pub fn next_state(&self, event: PreferenceEvent) -> ThemePreference {
        match event {
            PreferenceEvent::Load(loaded) | PreferenceEvent::Set(loaded) => loaded,
            PreferenceEvent::Cycle => self.state.next(),
        }
    }

    pub fn transition(&mut self, event: PreferenceEvent) -> ThemePreference {
        let next = self.next_state(event);
        tracing::debug!(from = %self.state, to = %next, ?event, "preference transition");

        self.transition_history
            .push(PreferenceTransition::new(self.state, event, next));
        self.state = next;
        self.state
    }

    pub fn history(&self) -> &[PreferenceTransition] {
        &self.transition_history
    }
}

impl std::fmt::Display for PreferenceMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ThemePreference::{:?}", self.state)
    }
}
