//! Bounded window of recent turns used as prompt context

use std::collections::VecDeque;

use chatapt_ai::HistoryTurn;

/// Default number of turns kept in the window
pub const MAX_HISTORY_SIZE: usize = 10;

/// FIFO buffer of at most `capacity` turns.
///
/// Appending to a full window evicts the oldest turn first, so the window
/// always holds the most recent turns in their original order.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    turns: VecDeque<HistoryTurn>,
    capacity: usize,
}

impl HistoryWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, turn: HistoryTurn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Independent copy of the current turns, oldest first
    pub fn snapshot(&self) -> Vec<HistoryTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbered(n: usize) -> HistoryTurn {
        if n % 2 == 0 {
            HistoryTurn::user(format!("turn {}", n))
        } else {
            HistoryTurn::model(format!("turn {}", n))
        }
    }

    #[test]
    fn test_append_below_capacity_keeps_all() {
        let mut window = HistoryWindow::default();
        for i in 0..5 {
            window.append(numbered(i));
        }
        assert_eq!(window.len(), 5);
        assert_eq!(window.snapshot()[0], numbered(0));
    }

    #[test]
    fn test_eleventh_append_drops_first() {
        let mut window = HistoryWindow::default();
        for i in 0..MAX_HISTORY_SIZE {
            window.append(numbered(i));
        }
        let before = window.snapshot();

        window.append(numbered(MAX_HISTORY_SIZE));
        let after = window.snapshot();

        let mut expected = before[1..].to_vec();
        expected.push(numbered(MAX_HISTORY_SIZE));
        assert_eq!(after, expected);
        assert_eq!(after.len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut window = HistoryWindow::new(3);
        window.append(numbered(0));
        let snapshot = window.snapshot();

        window.append(numbered(1));
        window.append(numbered(2));
        window.append(numbered(3));

        assert_eq!(snapshot, vec![numbered(0)]);
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let mut window = HistoryWindow::new(0);
        window.append(numbered(0));
        window.append(numbered(1));
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.snapshot(), vec![numbered(1)]);
    }

    proptest! {
        #[test]
        fn prop_window_holds_last_n_in_order(appends in 0usize..60, capacity in 1usize..16) {
            let mut window = HistoryWindow::new(capacity);
            for i in 0..appends {
                window.append(numbered(i));
                prop_assert!(window.len() <= capacity);
            }

            let expected: Vec<_> = (appends.saturating_sub(capacity)..appends).map(numbered).collect();
            prop_assert_eq!(window.snapshot(), expected);
        }
    }
}
