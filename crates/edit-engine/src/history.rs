//! Bounded undo/redo over whole-document snapshots.

use std::collections::VecDeque;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Snapshot history.
///
/// `record` is called with the state *before* a change. Undo swaps the
/// current state with the most recent snapshot, so redo can swap it back.
#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    capacity: usize,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<T: Clone> History<T> {
    /// Create a history holding at most `capacity` undo steps (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push the pre-change state. Clears the redo stack and evicts the oldest
    /// entry once the capacity is reached.
    pub fn record(&mut self, before: T) {
        self.redo.clear();
        if self.undo.len() == self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(before);
    }

    /// Restore the previous state into `current`. Returns `false` when there
    /// is nothing to undo.
    pub fn undo(&mut self, current: &mut T) -> bool {
        match self.undo.pop_back() {
            Some(previous) => {
                self.redo.push(std::mem::replace(current, previous));
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone state. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self, current: &mut T) -> bool {
        match self.redo.pop() {
            Some(next) => {
                self.undo.push_back(std::mem::replace(current, next));
                true
            }
            None => false,
        }
    }

    /// Drop the newest undo entry without touching the redo stack.
    pub fn discard_last(&mut self) -> Option<T> {
        self.undo.pop_back()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_swaps_states() {
        let mut history = History::new(10);
        let mut state = 1;

        history.record(state);
        state = 2;
        history.record(state);
        state = 3;

        assert!(history.undo(&mut state));
        assert_eq!(state, 2);
        assert!(history.undo(&mut state));
        assert_eq!(state, 1);
        assert!(!history.undo(&mut state));
        assert_eq!(state, 1);

        assert!(history.redo(&mut state));
        assert!(history.redo(&mut state));
        assert_eq!(state, 3);
        assert!(!history.redo(&mut state));
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(10);
        let mut state = 1;
        history.record(state);
        state = 2;
        history.undo(&mut state);
        assert!(history.can_redo());

        history.record(state);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new(50);
        let mut state = 0;
        for next in 1..=60 {
            history.record(state);
            state = next;
        }
        assert_eq!(history.undo_len(), 50);

        let mut undone = 0;
        while history.undo(&mut state) {
            undone += 1;
        }
        assert_eq!(undone, 50);
        assert_eq!(state, 10);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let history: History<u8> = History::new(0);
        assert_eq!(history.capacity(), 1);
    }
}
