//! Virtual clock with cancellable timed continuations
//!
//! Every delay in the game (spawn debounce, merge beat, booster fuses, the
//! game-over pause) is a task parked here until the clock passes its due time.
//! Tasks due at the same instant fire in scheduling order.

use std::collections::BTreeMap;
use std::time::Duration;

/// Handle for cancelling a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), T>,
    due_of: BTreeMap<TimerId, Duration>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 1,
            queue: BTreeMap::new(),
            due_of: BTreeMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule_after(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.now.saturating_add(delay);
        self.queue.insert((due, id), task);
        self.due_of.insert(id, due);
        id
    }

    /// Remove a pending task; `None` if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let due = self.due_of.remove(&id)?;
        self.queue.remove(&(due, id))
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_of.contains_key(&id)
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// Next task whose due time has passed
    pub fn pop_due(&mut self) -> Option<(TimerId, T)> {
        let (&(due, id), _) = self.queue.first_key_value()?;
        if due > self.now {
            return None;
        }
        self.due_of.remove(&id);
        self.queue.remove(&(due, id)).map(|task| (id, task))
    }

    /// Drop every pending task, keeping the clock
    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_of.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.queue.values()
    }
}
