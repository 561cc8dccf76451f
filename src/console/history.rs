//! Bounded history buffer.

use std::collections::VecDeque;

/// Ring buffer keeping the most recent `capacity` entries.
///
/// Pushing into a full buffer evicts the oldest entry. Index 0 is the oldest
/// entry still held.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryBuffer<T> {
    /// Creates an empty buffer. A capacity of 0 is raised to 1.
    ///
    /// Storage grows with the entries, not with `capacity`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_capacity() {
        let mut history = HistoryBuffer::new(3);
        history.push("a");
        history.push("b");
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0), Some(&"a"));
        assert_eq!(history.last(), Some(&"b"));
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut history = HistoryBuffer::new(3);
        for entry in ["a", "b", "c", "d"] {
            history.push(entry);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut history = HistoryBuffer::new(0);
        history.push(1);
        history.push(2);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.get(0), Some(&2));
        assert_eq!(history.get(1), None);
    }

    #[test]
    fn test_huge_capacity_does_not_preallocate() {
        let mut history = HistoryBuffer::new(usize::MAX);
        history.push("only");
        assert_eq!(history.capacity(), usize::MAX);
        assert_eq!(history.len(), 1);
        assert_eq!(history.last(), Some(&"only"));
    }
}
