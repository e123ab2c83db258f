//! Change notification for HUD-style observers
//!
//! Observers see one `HudSnapshot` per frame in which something they display
//! changed, never one per field write.

use serde::{Deserialize, Serialize};

use super::state::GameState;

/// The slice of state a HUD shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub combo: u32,
    pub is_fever: bool,
    pub life: u8,
    pub is_damaged: bool,
    pub is_paused: bool,
    pub is_game_over: bool,
}

impl HudSnapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            score: state.score,
            combo: state.combo,
            is_fever: state.is_fever,
            life: state.life,
            is_damaged: state.is_damaged(),
            is_paused: state.is_paused,
            is_game_over: state.is_game_over,
        }
    }
}

/// Handle returned by `Observers::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(&HudSnapshot)>;

#[derive(Default)]
pub struct Observers {
    listeners: Vec<(SubscriptionId, Listener)>,
    last: Option<HudSnapshot>,
    next_id: u32,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&HudSnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Forget the last published snapshot so the next `publish` always fires
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Notify every listener if the snapshot differs from the last one.
    /// Returns whether a notification went out.
    pub fn publish(&mut self, state: &GameState) -> bool {
        let snapshot = HudSnapshot::capture(state);
        if self.last == Some(snapshot) {
            return false;
        }
        self.last = Some(snapshot);
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
        true
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .field("last", &self.last)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notifies_once_per_change() {
        let mut observers = Observers::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        observers.subscribe(move |s| sink.borrow_mut().push(s.score));

        let mut state = GameState::new(1);
        assert!(observers.publish(&state));
        assert!(!observers.publish(&state));

        // Several writes, one notification
        state.score += 100;
        state.combo += 1;
        state.score += 100;
        assert!(observers.publish(&state));
        assert_eq!(*seen.borrow(), vec![0, 200]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut observers = Observers::new();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = observers.subscribe(move |_| *sink.borrow_mut() += 1);
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));

        observers.publish(&GameState::new(1));
        assert_eq!(*count.borrow(), 0);
    }
}
