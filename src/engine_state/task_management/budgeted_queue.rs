use std::{
    collections::{HashSet, VecDeque},
    hash::Hash,
};

/// FIFO queue of distinct items drained at most `budget` items per tick.
///
/// Membership is tracked in a set so that `contains` and `push_unique` stay
/// O(1) however long the queue grows.
#[derive(Debug, Clone)]
pub struct BudgetedQueue<T> {
    items: VecDeque<T>,
    members: HashSet<T>,
    budget: usize,
}

impl<T: Copy + Eq + Hash> BudgetedQueue<T> {
    pub fn new(budget: usize) -> Self {
        BudgetedQueue {
            items: VecDeque::new(),
            members: HashSet::new(),
            budget,
        }
    }

    /// Appends `item` unless it is already queued.
    ///
    /// # Returns
    /// `true` if the item was added.
    pub fn push_unique(&mut self, item: T) -> bool {
        if !self.members.insert(item) {
            return false;
        }
        self.items.push_back(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    /// Keeps only the items for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let members = &mut self.members;
        self.items.retain(|item| {
            let kept = keep(item);
            if !kept {
                members.remove(item);
            }
            kept
        });
    }

    /// Removes and returns this tick's share of items, oldest first.
    pub fn take_budgeted(&mut self) -> Vec<T> {
        let count = self.budget.min(self.items.len());
        let taken: Vec<T> = self.items.drain(..count).collect();
        for item in &taken {
            self.members.remove(item);
        }
        taken
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_at_most_budget_in_order() {
        let mut queue = BudgetedQueue::new(2);
        for i in 0..5 {
            assert!(queue.push_unique(i));
        }
        assert!(!queue.push_unique(3));

        assert_eq!(queue.take_budgeted(), vec![0, 1]);
        queue.retain(|&i| i != 3);
        assert!(!queue.contains(&3));
        assert_eq!(queue.take_budgeted(), vec![2, 4]);
        assert!(queue.take_budgeted().is_empty());
        assert!(queue.is_empty());

        // Drained items may be queued again.
        assert!(queue.push_unique(0));
    }
}
