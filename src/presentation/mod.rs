use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

use crate::theme::{EffectiveMode, Indicator, ThemePreference};

/// Root-node attribute that styling keys off.
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Where resolved modes end up.
pub trait Presenter {
    fn apply_mode(&mut self, mode: EffectiveMode);
    fn update_indicator(&mut self, indicator: &Indicator);
}

impl<T: Presenter + ?Sized> Presenter for Box<T> {
    fn apply_mode(&mut self, mode: EffectiveMode) {
        (**self).apply_mode(mode);
    }

    fn update_indicator(&mut self, indicator: &Indicator) {
        (**self).update_indicator(indicator);
    }
}

/// Attributes of the document root plus the toggle indicator state.
#[derive(Debug, Clone, Default)]
pub struct RootAttributes {
    attributes: BTreeMap<String, String>,
    indicator: Option<Indicator>,
    applied: usize,
}

impl RootAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn theme(&self) -> Option<&str> {
        self.attribute(THEME_ATTRIBUTE)
    }

    pub fn indicator(&self) -> Option<&Indicator> {
        self.indicator.as_ref()
    }

    /// Number of `apply_mode` calls so far.
    pub fn applied_count(&self) -> usize {
        self.applied
    }
}

impl Presenter for RootAttributes {
    fn apply_mode(&mut self, mode: EffectiveMode) {
        self.attributes
            .insert(THEME_ATTRIBUTE.to_string(), mode.as_str().to_string());
        self.applied += 1;
    }

    fn update_indicator(&mut self, indicator: &Indicator) {
        self.indicator = Some(indicator.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Initialize,
    Cycle,
    Set,
    Ambient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub preference: ThemePreference,
    pub mode: EffectiveMode,
    pub cause: ChangeCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub type ModeListener = Box<dyn FnMut(&ModeChange)>;

/// Subscribers to mode changes, notified in subscription order.
///
/// Listeners may subscribe, unsubscribe and raise further changes while a
/// change is being delivered. Nested changes are queued and delivered once
/// the current one has reached every listener.
#[derive(Default)]
pub struct ModeListeners {
    next_id: Cell<u64>,
    active: RefCell<Vec<(ListenerId, ModeListener)>>,
    in_flight: RefCell<Vec<ListenerId>>,
    cancelled: RefCell<Vec<ListenerId>>,
    queue: RefCell<VecDeque<ModeChange>>,
    dispatching: Cell<bool>,
}

impl ModeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: ModeListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.active.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut active = self.active.borrow_mut();
        if let Some(pos) = active.iter().position(|(existing, _)| *existing == id) {
            active.remove(pos);
            return true;
        }

        // Taken out for the delivery in progress; dropped when it is put back.
        let mut in_flight = self.in_flight.borrow_mut();
        match in_flight.iter().position(|existing| *existing == id) {
            Some(pos) => {
                in_flight.remove(pos);
                self.cancelled.borrow_mut().push(id);
                true
            }
            None => false,
        }
    }

    pub fn notify(&self, change: ModeChange) {
        self.queue.borrow_mut().push_back(change);
        if self.dispatching.replace(true) {
            return;
        }

        loop {
            let Some(change) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            let mut delivering = std::mem::take(&mut *self.active.borrow_mut());
            *self.in_flight.borrow_mut() = delivering.iter().map(|(id, _)| *id).collect();

            for (id, listener) in &mut delivering {
                if self.cancelled.borrow().contains(id) {
                    continue;
                }
                listener(&change);
            }

            self.in_flight.borrow_mut().clear();
            let cancelled = std::mem::take(&mut *self.cancelled.borrow_mut());
            delivering.retain(|(id, _)| !cancelled.contains(id));
            let mut active = self.active.borrow_mut();
            delivering.append(&mut active);
            *active = delivering;
        }

        self.dispatching.set(false);
    }
}

impl std::fmt::Debug for ModeListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeListeners")
            .field("listeners", &self.active.borrow().len())
            .field("dispatching", &self.dispatching.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn change(mode: EffectiveMode) -> ModeChange {
        ModeChange {
            preference: ThemePreference::Auto,
            mode,
            cause: ChangeCause::Ambient,
        }
    }

    #[test]
    fn root_attributes_track_theme_and_indicator() {
        let mut root = RootAttributes::new();
        assert_eq!(root.theme(), None);

        root.apply_mode(EffectiveMode::Dark);
        root.update_indicator(&Indicator::for_state(
            ThemePreference::Auto,
            EffectiveMode::Dark,
        ));

        assert_eq!(root.theme(), Some("dark"));
        assert_eq!(root.attribute(THEME_ATTRIBUTE), Some("dark"));
        assert_eq!(root.applied_count(), 1);
        assert_eq!(
            root.indicator().map(|i| i.label.as_str()),
            Some("Auto (currently dark)")
        );
    }

    #[test]
    fn listeners_are_notified_in_order_until_unsubscribed() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = ModeListeners::new();

        let first_log = Rc::clone(&log);
        let first = listeners.subscribe(Box::new(move |c| {
            first_log.borrow_mut().push(("first", c.mode));
        }));
        let second_log = Rc::clone(&log);
        listeners.subscribe(Box::new(move |c| {
            second_log.borrow_mut().push(("second", c.mode));
        }));

        listeners.notify(change(EffectiveMode::Dark));
        assert!(listeners.unsubscribe(first));
        assert!(!listeners.unsubscribe(first));
        listeners.notify(change(EffectiveMode::Light));

        assert_eq!(
            *log.borrow(),
            vec![
                ("first", EffectiveMode::Dark),
                ("second", EffectiveMode::Dark),
                ("second", EffectiveMode::Light),
            ]
        );
    }

    #[test]
    fn changes_raised_by_a_listener_are_delivered_after_the_current_one() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = Rc::new(ModeListeners::new());

        let nested = Rc::downgrade(&listeners);
        let first_log = Rc::clone(&log);
        listeners.subscribe(Box::new(move |c| {
            first_log.borrow_mut().push(("first", c.mode));
            if c.mode == EffectiveMode::Dark {
                if let Some(listeners) = nested.upgrade() {
                    listeners.notify(change(EffectiveMode::Light));
                }
            }
        }));
        let second_log = Rc::clone(&log);
        listeners.subscribe(Box::new(move |c| {
            second_log.borrow_mut().push(("second", c.mode));
        }));

        listeners.notify(change(EffectiveMode::Dark));

        assert_eq!(
            *log.borrow(),
            vec![
                ("first", EffectiveMode::Dark),
                ("second", EffectiveMode::Dark),
                ("first", EffectiveMode::Light),
                ("second", EffectiveMode::Light),
            ]
        );
    }

    #[test]
    fn listeners_may_subscribe_and_unsubscribe_during_delivery() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let listeners = Rc::new(ModeListeners::new());

        let late_calls = Rc::clone(&calls);
        let second_calls = Rc::clone(&calls);
        let second = listeners.subscribe(Box::new(move |_| second_calls.borrow_mut().push("second")));
        let handle = Rc::downgrade(&listeners);
        let mut late = Some(late_calls);
        let first_calls = Rc::clone(&calls);
        let first = listeners.subscribe(Box::new(move |_| {
            first_calls.borrow_mut().push("first");
            let Some(listeners) = handle.upgrade() else {
                return;
            };
            if let Some(late_calls) = late.take() {
                assert!(listeners.unsubscribe(second));
                listeners.subscribe(Box::new(move |_| late_calls.borrow_mut().push("late")));
            }
        }));

        listeners.notify(change(EffectiveMode::Dark));
        listeners.notify(change(EffectiveMode::Light));
        assert!(listeners.unsubscribe(first));
        listeners.notify(change(EffectiveMode::Dark));

        assert_eq!(
            *calls.borrow(),
            vec!["second", "first", "first", "late", "late"]
        );
    }
}
