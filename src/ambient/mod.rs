//! Ambient color-scheme signal: what the host platform says the user prefers.
//!
//! Sources are read-only from the resolver's point of view. A source reports
//! the current value on demand and pushes every later change to its sinks.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::AppConfig;

#[cfg(feature = "gtk")]
mod gtk;
#[cfg(feature = "gtk")]
pub use gtk::GtkSignal;

pub const PREFERS_DARK_ENV: &str = "FOLIO_THEME_PREFERS_DARK";

/// Receives the new "prefers dark" value after each change. Returns `false`
/// once its receiver is gone, after which a source may drop it.
pub type AmbientSink = Box<dyn Fn(bool) -> bool>;

pub trait AmbientSignal {
    fn prefers_dark(&self) -> bool;
    fn subscribe(&self, sink: AmbientSink);
}

impl<T: AmbientSignal + ?Sized> AmbientSignal for Rc<T> {
    fn prefers_dark(&self) -> bool {
        (**self).prefers_dark()
    }

    fn subscribe(&self, sink: AmbientSink) {
        (**self).subscribe(sink);
    }
}

impl<T: AmbientSignal + ?Sized> AmbientSignal for Box<T> {
    fn prefers_dark(&self) -> bool {
        (**self).prefers_dark()
    }

    fn subscribe(&self, sink: AmbientSink) {
        (**self).subscribe(sink);
    }
}

/// A signal that never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSignal(pub bool);

impl AmbientSignal for FixedSignal {
    fn prefers_dark(&self) -> bool {
        self.0
    }

    fn subscribe(&self, _sink: AmbientSink) {}
}

/// Signal driven by the caller. Clones share state, so one handle can be
/// given to the resolver while another flips the value.
#[derive(Clone, Default)]
pub struct ManualSignal {
    inner: Rc<ManualInner>,
}

#[derive(Default)]
struct ManualInner {
    prefers_dark: Cell<bool>,
    sinks: RefCell<Vec<Rc<dyn Fn(bool) -> bool>>>,
}

impl ManualSignal {
    pub fn new(prefers_dark: bool) -> Self {
        let signal = Self::default();
        signal.inner.prefers_dark.set(prefers_dark);
        signal
    }

    /// Updates the value and notifies subscribers. Setting the current value
    /// again is not a change and notifies nobody. Sinks may call back into
    /// this signal; they run against a snapshot of the subscriber list.
    pub fn set(&self, prefers_dark: bool) {
        if self.inner.prefers_dark.replace(prefers_dark) == prefers_dark {
            return;
        }
        tracing::debug!(prefers_dark, "ambient signal changed");

        let snapshot = self.inner.sinks.borrow().clone();
        let gone: Vec<_> = snapshot
            .into_iter()
            .filter(|sink| !(**sink)(prefers_dark))
            .collect();
        if !gone.is_empty() {
            self.inner
                .sinks
                .borrow_mut()
                .retain(|sink| !gone.iter().any(|dead| Rc::ptr_eq(sink, dead)));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.sinks.borrow().len()
    }
}

impl std::fmt::Debug for ManualSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualSignal")
            .field("prefers_dark", &self.inner.prefers_dark.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl AmbientSignal for ManualSignal {
    fn prefers_dark(&self) -> bool {
        self.inner.prefers_dark.get()
    }

    fn subscribe(&self, sink: AmbientSink) {
        self.inner.sinks.borrow_mut().push(Rc::from(sink));
    }
}

/// Headless fallback: `FOLIO_THEME_PREFERS_DARK`, then config, then light.
pub fn ambient_from_env(config: &AppConfig) -> FixedSignal {
    let env = std::env::var(PREFERS_DARK_ENV).ok();
    ambient_from_env_with(env.as_deref(), config)
}

fn ambient_from_env_with(env: Option<&str>, config: &AppConfig) -> FixedSignal {
    let from_env = env.and_then(parse_prefers_dark);
    FixedSignal(from_env.or(config.prefers_dark).unwrap_or(false))
}

pub fn parse_prefers_dark(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "dark" => Some(true),
        "0" | "false" | "no" | "light" => Some(false),
        _ => {
            tracing::warn!(raw, "ignoring unrecognised {PREFERS_DARK_ENV} value");
            None
        }
    }
}
