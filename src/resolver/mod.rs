//! Tri-state theme preference resolved against the ambient color scheme.
//!
//! The resolver owns the user's choice, writes it through to storage on every
//! change, and pushes the resolved mode to a [`Presenter`] and to subscribed
//! listeners. The effective mode is never cached: it is recomputed from the
//! preference and the live ambient signal whenever it is asked for.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::ambient::AmbientSignal;
use crate::presentation::{ChangeCause, ListenerId, ModeChange, ModeListener, ModeListeners, Presenter};
use crate::state::{PreferenceEvent, PreferenceMachine, PreferenceTransition};
use crate::storage::{PreferenceStore, THEME_STORAGE_KEY};
use crate::theme::{resolve_effective_mode, EffectiveMode, Indicator, ThemePreference};

#[derive(Debug)]
pub struct PreferenceResolver<S, A, P> {
    machine: PreferenceMachine,
    storage_key: String,
    store: S,
    ambient: A,
    presenter: P,
}

impl<S, A, P> PreferenceResolver<S, A, P>
where
    S: PreferenceStore,
    A: AmbientSignal,
    P: Presenter,
{
    pub fn new(store: S, ambient: A, presenter: P) -> Self {
        Self {
            machine: PreferenceMachine::new(),
            storage_key: THEME_STORAGE_KEY.to_string(),
            store,
            ambient,
            presenter,
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Loads the persisted preference, applies it, and starts following the
    /// ambient signal. Dropping every clone of the returned handle ends the
    /// ambient subscription.
    pub fn initialize(mut self) -> SharedResolver<S, A, P>
    where
        S: 'static,
        A: 'static,
        P: 'static,
    {
        let loaded = self.load_persisted();
        self.machine.transition(PreferenceEvent::Load(loaded));
        self.persist();
        self.apply(ChangeCause::Initialize);

        let handle = SharedResolver {
            shared: Rc::new(Shared {
                resolver: RefCell::new(self),
                listeners: ModeListeners::new(),
                stale: Cell::new(false),
            }),
        };
        let weak = Rc::downgrade(&handle.shared);
        handle
            .shared
            .resolver
            .borrow()
            .ambient
            .subscribe(Box::new(move |prefers_dark| {
                let Some(shared) = weak.upgrade() else {
                    return false;
                };
                SharedResolver { shared }.on_ambient_change(prefers_dark);
                true
            }));
        handle
    }

    pub fn resolve(&self) -> EffectiveMode {
        resolve_effective_mode(self.preference(), self.ambient.prefers_dark())
    }

    pub fn current_mode(&self) -> EffectiveMode {
        self.resolve()
    }

    pub fn preference(&self) -> ThemePreference {
        self.machine.state()
    }

    pub fn indicator(&self) -> Indicator {
        Indicator::for_state(self.preference(), self.resolve())
    }

    pub fn history(&self) -> &[PreferenceTransition] {
        self.machine.history()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ambient(&self) -> &A {
        &self.ambient
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Reapplies when following the ambient signal; explicit choices are left alone.
    fn reapply_for_ambient(&mut self) -> Option<ModeChange> {
        if !self.preference().is_auto() {
            tracing::debug!(
                preference = %self.preference(),
                "ignoring ambient change for explicit preference"
            );
            return None;
        }
        Some(self.apply(ChangeCause::Ambient))
    }

    fn mutate(&mut self, event: PreferenceEvent, cause: ChangeCause) -> ModeChange {
        self.machine.transition(event);
        self.persist();
        self.apply(cause)
    }

    fn load_persisted(&self) -> ThemePreference {
        match self.store.read(&self.storage_key) {
            Ok(Some(raw)) => ThemePreference::parse_lenient(&raw),
            Ok(None) => ThemePreference::Auto,
            Err(err) => {
                tracing::warn!(?err, key = %self.storage_key, "failed to read theme preference; using auto");
                ThemePreference::Auto
            }
        }
    }

    fn persist(&mut self) {
        let preference = self.preference();
        if let Err(err) = self.store.write(&self.storage_key, preference.as_str()) {
            tracing::warn!(?err, key = %self.storage_key, %preference, "failed to persist theme preference");
        }
    }

    fn apply(&mut self, cause: ChangeCause) -> ModeChange {
        let preference = self.preference();
        let mode = self.resolve();
        self.presenter.apply_mode(mode);
        self.presenter
            .update_indicator(&Indicator::for_state(preference, mode));
        tracing::info!(%preference, %mode, ?cause, "theme applied");

        ModeChange {
            preference,
            mode,
            cause,
        }
    }
}

/// Handle returned by [`PreferenceResolver::initialize`]. Clones share one
/// resolver; hand them to whatever needs to query or drive the theme.
///
/// Listeners run after the resolver is released, so they may query or drive
/// the handle they were subscribed on.
#[derive(Debug)]
pub struct SharedResolver<S, A, P> {
    shared: Rc<Shared<S, A, P>>,
}

#[derive(Debug)]
struct Shared<S, A, P> {
    resolver: RefCell<PreferenceResolver<S, A, P>>,
    listeners: ModeListeners,
    /// An ambient change arrived while the resolver was borrowed.
    stale: Cell<bool>,
}

impl<S, A, P> Clone for SharedResolver<S, A, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S, A, P> SharedResolver<S, A, P>
where
    S: PreferenceStore,
    A: AmbientSignal,
    P: Presenter,
{
    /// Advances `auto -> light -> dark -> auto`.
    pub fn cycle(&self) -> ThemePreference {
        self.run(|resolver| resolver.mutate(PreferenceEvent::Cycle, ChangeCause::Cycle))
            .preference
    }

    pub fn set(&self, preference: ThemePreference) -> ThemePreference {
        self.run(|resolver| resolver.mutate(PreferenceEvent::Set(preference), ChangeCause::Set))
            .preference
    }

    /// Unknown spellings select `Auto`.
    pub fn set_raw(&self, raw: &str) -> ThemePreference {
        self.set(ThemePreference::parse_lenient(raw))
    }

    pub fn resolve(&self) -> EffectiveMode {
        self.with(PreferenceResolver::resolve)
    }

    pub fn current_mode(&self) -> EffectiveMode {
        self.resolve()
    }

    pub fn preference(&self) -> ThemePreference {
        self.with(PreferenceResolver::preference)
    }

    pub fn indicator(&self) -> Indicator {
        self.with(PreferenceResolver::indicator)
    }

    pub fn subscribe(&self, listener: ModeListener) -> ListenerId {
        self.shared.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.listeners.unsubscribe(id)
    }

    /// Read access to the resolver. `f` must not drive this handle.
    pub fn with<R>(&self, f: impl FnOnce(&PreferenceResolver<S, A, P>) -> R) -> R {
        let out = f(&self.shared.resolver.borrow());
        self.flush_stale();
        out
    }

    fn run(&self, f: impl FnOnce(&mut PreferenceResolver<S, A, P>) -> ModeChange) -> ModeChange {
        let change = f(&mut self.shared.resolver.borrow_mut());
        self.shared.listeners.notify(change);
        self.flush_stale();
        change
    }

    fn on_ambient_change(&self, prefers_dark: bool) {
        let change = match self.shared.resolver.try_borrow_mut() {
            Ok(mut resolver) => resolver.reapply_for_ambient(),
            Err(_) => {
                tracing::debug!(prefers_dark, "resolver busy; deferring ambient change");
                self.shared.stale.set(true);
                None
            }
        };
        if let Some(change) = change {
            self.shared.listeners.notify(change);
        }
        self.flush_stale();
    }

    fn flush_stale(&self) {
        while self.shared.stale.replace(false) {
            let change = match self.shared.resolver.try_borrow_mut() {
                Ok(mut resolver) => resolver.reapply_for_ambient(),
                Err(_) => {
                    // Still borrowed further up the stack; that caller flushes.
                    self.shared.stale.set(true);
                    return;
                }
            };
            if let Some(change) = change {
                self.shared.listeners.notify(change);
            }
        }
    }
}
