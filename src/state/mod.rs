pub mod event;
pub mod machine;

pub use event::{PreferenceEvent, PreferenceTransition};
pub use machine::PreferenceMachine;
