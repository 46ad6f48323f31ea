//! Indexed binary min-heap keyed by vertex slot.
//!
//! Unlike `std::collections::BinaryHeap`, entries can be re-prioritised or
//! removed in O(log n) because each key remembers its slot in the heap.

const ABSENT: usize = usize::MAX;

#[derive(Debug, Clone)]
pub(crate) struct IndexedHeap {
    entries: Vec<(f64, usize)>,
    slots: Vec<usize>,
}

impl IndexedHeap {
    /// A heap accepting keys in `0..num_keys`.
    pub fn with_keys(num_keys: usize) -> Self {
        Self {
            entries: Vec::with_capacity(num_keys),
            slots: vec![ABSENT; num_keys],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, key: usize) -> bool {
        self.slots[key] != ABSENT
    }

    /// Insert `key`, or move it if it is already queued.
    pub fn push_or_update(&mut self, key: usize, priority: f64) {
        match self.slots[key] {
            ABSENT => {
                let slot = self.entries.len();
                self.entries.push((priority, key));
                self.slots[key] = slot;
                self.sift_up(slot);
            }
            slot => {
                let old = self.entries[slot].0;
                self.entries[slot].0 = priority;
                if priority < old {
                    self.sift_up(slot);
                } else {
                    self.sift_down(slot);
                }
            }
        }
    }

    /// Remove `key` if present.
    pub fn remove(&mut self, key: usize) {
        let slot = self.slots[key];
        if slot == ABSENT {
            return;
        }

        let last = self.entries.len() - 1;
        self.swap(slot, last);
        self.entries.pop();
        self.slots[key] = ABSENT;

        if slot < self.entries.len() {
            self.sift_down(slot);
            self.sift_up(slot);
        }
    }

    /// Remove and return the key with the smallest priority.
    ///
    /// Equal priorities pop in ascending key order.
    pub fn pop(&mut self) -> Option<(usize, f64)> {
        let &(priority, key) = self.entries.first()?;
        self.remove(key);
        Some((key, priority))
    }

    fn less(&self, a: usize, b: usize) -> bool {
        let (pa, ka) = self.entries[a];
        let (pb, kb) = self.entries[b];
        pa.total_cmp(&pb).then(ka.cmp(&kb)).is_lt()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.slots[self.entries[a].1] = a;
        self.slots[self.entries[b].1] = b;
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.less(slot, parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;

            if left < self.entries.len() && self.less(left, smallest) {
                smallest = left;
            }
            if right < self.entries.len() && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_in_priority_order() {
        let mut heap = IndexedHeap::with_keys(6);
        for (key, p) in [(0, 5.0), (1, 1.0), (2, 4.0), (3, 2.0), (4, 3.0)] {
            heap.push_or_update(key, p);
        }
        assert_eq!(heap.len(), 5);

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|(k, _)| k)).collect();
        assert_eq!(order, vec![1, 3, 4, 2, 0]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_update_moves_both_ways() {
        let mut heap = IndexedHeap::with_keys(3);
        heap.push_or_update(0, 1.0);
        heap.push_or_update(1, 2.0);
        heap.push_or_update(2, 3.0);

        heap.push_or_update(2, 0.5);
        heap.push_or_update(0, 10.0);

        assert_eq!(heap.pop(), Some((2, 0.5)));
        assert_eq!(heap.pop(), Some((1, 2.0)));
        assert_eq!(heap.pop(), Some((0, 10.0)));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn test_remove_middle_entry() {
        let mut heap = IndexedHeap::with_keys(4);
        for key in 0..4 {
            heap.push_or_update(key, key as f64);
        }

        heap.remove(1);
        heap.remove(1);
        assert!(!heap.contains(1));
        assert!(heap.contains(3));

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|(k, _)| k)).collect();
        assert_eq!(order, vec![0, 2, 3]);
    }

    #[test]
    fn test_ties_break_on_key() {
        let mut heap = IndexedHeap::with_keys(3);
        heap.push_or_update(2, 1.0);
        heap.push_or_update(0, 1.0);
        heap.push_or_update(1, 1.0);
        assert_eq!(heap.pop(), Some((0, 1.0)));
        assert_eq!(heap.pop(), Some((1, 1.0)));
    }
}
