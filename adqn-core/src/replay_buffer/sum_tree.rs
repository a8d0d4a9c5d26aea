//! Sum tree over priorities raised to `alpha`.
use segment_tree::{
    ops::{MaxIgnoreNaN, MinIgnoreNaN},
    SegmentPoint,
};

/// Binary tree of partial sums of `priority^alpha`.
///
/// Leaves are padded to a power of two so that the order of leaves equals
/// the order of slots, which makes stratified sampling follow the slot order.
/// Parents are recomputed from their children on every update, so the sums
/// never drift from the leaves.
pub struct SumTree {
    alpha: f32,
    capacity: usize,
    n_leaves: usize,
    tree: Vec<f64>,

    // Raw priorities, for the priority given to new transitions.
    max_tree: SegmentPoint<f32, MaxIgnoreNaN>,

    // Priorities raised to alpha, for normalizing importance weights.
    min_tree: SegmentPoint<f32, MinIgnoreNaN>,
}

impl SumTree {
    /// Creates a tree with `capacity` zero-priority leaves.
    pub fn new(capacity: usize, alpha: f32) -> Self {
        let n_leaves = capacity.next_power_of_two();
        Self {
            alpha,
            capacity,
            n_leaves,
            tree: vec![0f64; 2 * n_leaves - 1],
            max_tree: SegmentPoint::build(vec![0f32; capacity], MaxIgnoreNaN),
            min_tree: SegmentPoint::build(vec![f32::MAX; capacity], MinIgnoreNaN),
        }
    }

    /// The number of leaves that can hold a priority.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sets the priority of leaf `ix`.
    pub fn set(&mut self, ix: usize, priority: f32) {
        debug_assert!(ix < self.capacity);
        debug_assert!(priority >= 0.0);
        let p_alpha = priority.powf(self.alpha);

        let mut node = ix + self.n_leaves - 1;
        self.tree[node] = p_alpha as f64;
        while node > 0 {
            node = (node - 1) / 2;
            self.tree[node] = self.tree[2 * node + 1] + self.tree[2 * node + 2];
        }

        self.max_tree.modify(ix, priority);
        self.min_tree.modify(ix, p_alpha);
    }

    /// `priority^alpha` of leaf `ix`.
    pub fn leaf(&self, ix: usize) -> f64 {
        self.tree[ix + self.n_leaves - 1]
    }

    /// Sum of `priority^alpha` over all leaves.
    pub fn total(&self) -> f64 {
        self.tree[0]
    }

    /// The largest raw priority among the first `n` leaves.
    pub fn max(&self, n: usize) -> f32 {
        self.max_tree.query(0, n)
    }

    /// The smallest `priority^alpha` among the first `n` leaves.
    pub fn min_p_alpha(&self, n: usize) -> f32 {
        self.min_tree.query(0, n)
    }

    /// Finds the leaf at cumulative mass `s`.
    ///
    /// Subtrees with zero mass are never entered, so empty leaves are not returned
    /// as long as the total is positive.
    pub fn find(&self, mut s: f64) -> usize {
        let mut node = 0;
        while node < self.n_leaves - 1 {
            let left = 2 * node + 1;
            let right = left + 1;
            if s < self.tree[left] || self.tree[right] <= 0.0 {
                node = left;
            } else {
                s -= self.tree[left];
                node = right;
            }
        }
        node + 1 - self.n_leaves
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sum_tree_odd() {
        let data = [0.5f32, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let mut tree = SumTree::new(data.len(), 1.0);
        for (ix, &p) in data.iter().enumerate() {
            tree.set(ix, p);
        }

        let total: f32 = data.iter().sum();
        assert!((tree.total() as f32 - total).abs() < 1e-5);
        assert_eq!(tree.find(0.0), 0);
        assert_eq!(tree.find(0.4), 0);
        assert_eq!(tree.find(0.6), 1);
        assert_eq!(tree.find(1.4), 2);
        assert_eq!(tree.find(1.6), 3);
        assert_eq!(tree.find(total as f64 - 1e-3), 6);
        // Beyond the total, the search stays on occupied leaves.
        assert_eq!(tree.find(total as f64 + 1.0), 6);
        assert_eq!(tree.max(data.len()), 3.9);
        assert_eq!(tree.min_p_alpha(data.len()), 0.2);
    }

    #[test]
    fn test_sum_tree_update_keeps_total() {
        let mut tree = SumTree::new(5, 0.5);
        for ix in 0..5 {
            tree.set(ix, 4.0);
        }
        assert!((tree.total() - 10.0).abs() < 1e-9);

        tree.set(2, 16.0);
        assert!((tree.total() - 12.0).abs() < 1e-9);
        assert!((tree.leaf(2) - 4.0).abs() < 1e-9);
        assert_eq!(tree.max(5), 16.0);

        // Lowering the maximum is reflected immediately.
        tree.set(2, 1.0);
        assert_eq!(tree.max(5), 4.0);
        assert!((tree.total() - 9.0).abs() < 1e-9);
    }
}
