use crate::{interval::Interval, value::Float64};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{RngCore, SeedableRng},
};
use std::cmp::Ordering;

///
/// IntervalSearchTree
///
/// Randomized balanced binary search tree over intervals, keyed by
/// `(low, high)` and augmented with subtree size and subtree max. Balancing
/// is by random root-insertion (a treap without explicit priorities): during
/// the insertion descent the new node becomes the subtree root with
/// probability `1/(size + 1)`, and deletion joins the children with chance
/// proportional to each side's size. Expected height stays logarithmic
/// without rotation bookkeeping.
///
/// Nodes live in an arena and are addressed by index; equal intervals share
/// one node and carry a row list, so duplicate `(start, end)` pairs coexist.
///
/// The pseudo-random source is seeded per tree instance, so shapes are
/// reproducible under test.
///

pub(crate) type NodeId = usize;

/// Seed used when the caller does not supply one.
const DEFAULT_SEED: u64 = 0x5eed_c0de;

#[derive(Debug)]
struct IntervalNode {
    interval: Interval,
    rows: Vec<usize>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    /// Nodes in this subtree (row multiplicity not counted).
    size: usize,
    /// Max `high` endpoint in this subtree.
    max: Float64,
}

#[derive(Debug)]
pub struct IntervalSearchTree {
    nodes: Vec<IntervalNode>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    rng: ChaCha8Rng,
}

impl IntervalSearchTree {
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Distinct intervals currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.map_or(0, |id| self.nodes[id].size)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert one `(interval, row)` pair. An equal interval appends to the
    /// existing node's row list; tree shape is untouched in that case.
    pub fn add(&mut self, interval: Interval, row: usize) {
        let root = self.root;
        self.root = Some(self.randomized_insert(root, interval, row));
    }

    /// Remove one `(interval, row)` pair; returns false if the pair was not
    /// present. The node is joined away only when its row list empties.
    pub fn remove(&mut self, interval: &Interval, row: usize) -> bool {
        let mut removed = false;
        let root = self.root;
        self.root = self.remove_rec(root, interval, row, &mut removed);

        removed
    }

    /// All rows whose interval contains `point`, pruning every subtree whose
    /// max endpoint is below the probe.
    #[must_use]
    pub fn stab(&self, point: Float64) -> Vec<usize> {
        let mut out = Vec::new();
        self.stab_rec(self.root, point, &mut out);

        out
    }

    /// All rows whose interval intersects `query`; same pruning as `stab`
    /// with the containment test widened to interval overlap.
    #[must_use]
    pub fn search_all(&self, query: &Interval) -> Vec<usize> {
        let mut out = Vec::new();
        self.search_rec(self.root, query, &mut out);

        out
    }

    /// In-order interval sequence. Diagnostics and test support.
    #[must_use]
    pub fn in_order(&self) -> Vec<Interval> {
        let mut out = Vec::new();
        self.in_order_rec(self.root, &mut out);

        out
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
    }

    // ── Insertion ──────────────────────────────────────────────

    fn randomized_insert(&mut self, h: Option<NodeId>, interval: Interval, row: usize) -> NodeId {
        let Some(id) = h else {
            return self.alloc(interval, row);
        };

        match interval.cmp(&self.nodes[id].interval) {
            Ordering::Equal => {
                self.nodes[id].rows.push(row);
                id
            }
            ord => {
                if self.coin(self.nodes[id].size + 1) {
                    return self.root_insert(Some(id), interval, row);
                }

                if ord == Ordering::Less {
                    let left = self.nodes[id].left;
                    let child = self.randomized_insert(left, interval, row);
                    self.nodes[id].left = Some(child);
                } else {
                    let right = self.nodes[id].right;
                    let child = self.randomized_insert(right, interval, row);
                    self.nodes[id].right = Some(child);
                }
                self.fix(id);

                id
            }
        }
    }

    /// Insert at the subtree root: descend as a plain BST insert, then
    /// rotate the new node up one level on the way back.
    fn root_insert(&mut self, h: Option<NodeId>, interval: Interval, row: usize) -> NodeId {
        let Some(id) = h else {
            return self.alloc(interval, row);
        };

        match interval.cmp(&self.nodes[id].interval) {
            Ordering::Equal => {
                self.nodes[id].rows.push(row);
                id
            }
            Ordering::Less => {
                let left = self.nodes[id].left;
                let child = self.root_insert(left, interval, row);
                self.nodes[id].left = Some(child);
                self.rotate_right(id, child)
            }
            Ordering::Greater => {
                let right = self.nodes[id].right;
                let child = self.root_insert(right, interval, row);
                self.nodes[id].right = Some(child);
                self.rotate_left(id, child)
            }
        }
    }

    /// Rotate `left` (the left child of `h`) into h's place.
    fn rotate_right(&mut self, h: NodeId, left: NodeId) -> NodeId {
        self.nodes[h].left = self.nodes[left].right;
        self.nodes[left].right = Some(h);
        self.fix(h);
        self.fix(left);

        left
    }

    /// Rotate `right` (the right child of `h`) into h's place.
    fn rotate_left(&mut self, h: NodeId, right: NodeId) -> NodeId {
        self.nodes[h].right = self.nodes[right].left;
        self.nodes[right].left = Some(h);
        self.fix(h);
        self.fix(right);

        right
    }

    // ── Removal ────────────────────────────────────────────────

    fn remove_rec(
        &mut self,
        h: Option<NodeId>,
        interval: &Interval,
        row: usize,
        removed: &mut bool,
    ) -> Option<NodeId> {
        let id = h?;

        match interval.cmp(&self.nodes[id].interval) {
            Ordering::Less => {
                let left = self.nodes[id].left;
                self.nodes[id].left = self.remove_rec(left, interval, row, removed);
                self.fix(id);
                Some(id)
            }
            Ordering::Greater => {
                let right = self.nodes[id].right;
                self.nodes[id].right = self.remove_rec(right, interval, row, removed);
                self.fix(id);
                Some(id)
            }
            Ordering::Equal => {
                let rows = &mut self.nodes[id].rows;
                if let Some(pos) = rows.iter().position(|&r| r == row) {
                    rows.swap_remove(pos);
                    *removed = true;
                }

                if self.nodes[id].rows.is_empty() {
                    let left = self.nodes[id].left;
                    let right = self.nodes[id].right;
                    self.release(id);
                    self.join(left, right)
                } else {
                    Some(id)
                }
            }
        }
    }

    /// Weighted random join: the larger side wins the root slot with
    /// probability proportional to its size, preserving expected balance.
    fn join(&mut self, left: Option<NodeId>, right: Option<NodeId>) -> Option<NodeId> {
        match (left, right) {
            (None, other) | (other, None) => other,
            (Some(l), Some(r)) => {
                let size_l = self.nodes[l].size;
                let size_r = self.nodes[r].size;

                if (self.rng.next_u64() as usize) % (size_l + size_r) < size_l {
                    let lr = self.nodes[l].right;
                    self.nodes[l].right = self.join(lr, Some(r));
                    self.fix(l);
                    Some(l)
                } else {
                    let rl = self.nodes[r].left;
                    self.nodes[r].left = self.join(Some(l), rl);
                    self.fix(r);
                    Some(r)
                }
            }
        }
    }

    // ── Queries ────────────────────────────────────────────────

    fn stab_rec(&self, h: Option<NodeId>, point: Float64, out: &mut Vec<usize>) {
        let Some(id) = h else { return };
        let node = &self.nodes[id];

        // nothing in this subtree reaches the probe
        if node.max < point {
            return;
        }

        self.stab_rec(node.left, point, out);

        if node.interval.contains(point) {
            out.extend_from_slice(&node.rows);
        }

        // right-subtree lows are >= node's low; below the probe they may
        // still contain it, above they cannot
        if node.interval.low() <= point {
            self.stab_rec(node.right, point, out);
        }
    }

    fn search_rec(&self, h: Option<NodeId>, query: &Interval, out: &mut Vec<usize>) {
        let Some(id) = h else { return };
        let node = &self.nodes[id];

        if node.max < query.low() {
            return;
        }

        self.search_rec(node.left, query, out);

        if node.interval.intersects(query) {
            out.extend_from_slice(&node.rows);
        }

        if node.interval.low() <= query.high() {
            self.search_rec(node.right, query, out);
        }
    }

    fn in_order_rec(&self, h: Option<NodeId>, out: &mut Vec<Interval>) {
        let Some(id) = h else { return };
        let node = &self.nodes[id];
        self.in_order_rec(node.left, out);
        out.push(node.interval);
        self.in_order_rec(node.right, out);
    }

    // ── Arena plumbing ─────────────────────────────────────────

    /// Aggregate size/max from the node's own interval and children.
    fn fix(&mut self, id: NodeId) {
        let (left, right) = (self.nodes[id].left, self.nodes[id].right);
        let mut size = 1;
        let mut max = self.nodes[id].interval.high();

        if let Some(l) = left {
            size += self.nodes[l].size;
            max = max.max(self.nodes[l].max);
        }
        if let Some(r) = right {
            size += self.nodes[r].size;
            max = max.max(self.nodes[r].max);
        }

        self.nodes[id].size = size;
        self.nodes[id].max = max;
    }

    /// True with probability `1/n`.
    fn coin(&mut self, n: usize) -> bool {
        (self.rng.next_u64() as usize) % n == 0
    }

    fn alloc(&mut self, interval: Interval, row: usize) -> NodeId {
        let node = IntervalNode {
            interval,
            rows: vec![row],
            left: None,
            right: None,
            size: 1,
            max: interval.high(),
        };

        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id].rows.clear();
        self.nodes[id].left = None;
        self.nodes[id].right = None;
        self.free.push(id);
    }
}

impl Default for IntervalSearchTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn interval(low: f64, high: f64) -> Interval {
        Interval::new(
            Float64::try_new(low).unwrap(),
            Float64::try_new(high).unwrap(),
        )
    }

    fn point(v: f64) -> Float64 {
        Float64::try_new(v).unwrap()
    }

    /// Recompute size/max bottom-up and compare against stored values;
    /// check the in-order BST invariant along the way.
    fn check_invariants(tree: &IntervalSearchTree) {
        fn walk(tree: &IntervalSearchTree, h: Option<NodeId>) -> Option<(usize, Float64)> {
            let id = h?;
            let node = &tree.nodes[id];

            let left = walk(tree, node.left);
            let right = walk(tree, node.right);

            let mut size = 1;
            let mut max = node.interval.high();
            if let Some((s, m)) = left {
                size += s;
                max = max.max(m);
            }
            if let Some((s, m)) = right {
                size += s;
                max = max.max(m);
            }

            assert_eq!(node.size, size, "stale subtree size");
            assert_eq!(node.max, max, "stale subtree max");
            assert!(!node.rows.is_empty(), "empty nodes must be joined away");

            Some((size, max))
        }

        walk(tree, tree.root);

        let in_order = tree.in_order();
        for pair in in_order.windows(2) {
            assert!(pair[0] < pair[1], "in-order traversal must be sorted");
        }
    }

    #[test]
    fn stab_and_search_all_on_the_spec_scenario() {
        let mut tree = IntervalSearchTree::with_seed(11);
        tree.add(interval(1.0, 5.0), 0);
        tree.add(interval(2.0, 6.0), 1);
        tree.add(interval(10.0, 12.0), 2);

        let stabbed: BTreeSet<usize> = tree.stab(point(4.0)).into_iter().collect();
        assert_eq!(stabbed, BTreeSet::from([0, 1]));

        let overlapping: BTreeSet<usize> =
            tree.search_all(&interval(6.0, 9.0)).into_iter().collect();
        assert_eq!(overlapping, BTreeSet::from([1]));

        assert!(tree.stab(point(13.0)).is_empty());
        check_invariants(&tree);
    }

    #[test]
    fn equal_intervals_share_a_node_and_remove_individually() {
        let mut tree = IntervalSearchTree::with_seed(5);
        tree.add(interval(1.0, 3.0), 10);
        tree.add(interval(1.0, 3.0), 20);

        assert_eq!(tree.len(), 1, "equal intervals share one node");
        let mut rows = tree.stab(point(2.0));
        rows.sort_unstable();
        assert_eq!(rows, vec![10, 20]);

        assert!(tree.remove(&interval(1.0, 3.0), 10));
        assert_eq!(tree.stab(point(2.0)), vec![20]);
        assert!(!tree.remove(&interval(1.0, 3.0), 10), "already removed");

        assert!(tree.remove(&interval(1.0, 3.0), 20));
        assert!(tree.is_empty());
    }

    #[test]
    fn removal_joins_children_and_reaggregates() {
        let mut tree = IntervalSearchTree::with_seed(99);
        for (row, (lo, hi)) in [(1.0, 8.0), (2.0, 3.0), (4.0, 9.0), (5.0, 6.0), (0.0, 2.0)]
            .into_iter()
            .enumerate()
        {
            tree.add(interval(lo, hi), row);
        }
        check_invariants(&tree);

        assert!(tree.remove(&interval(1.0, 8.0), 0));
        check_invariants(&tree);

        let hits: BTreeSet<usize> = tree.stab(point(8.5)).into_iter().collect();
        assert_eq!(hits, BTreeSet::from([2]));
    }

    /// Pre-order interval walk exposes the actual tree shape, unlike the
    /// (always sorted) in-order sequence.
    fn preorder(tree: &IntervalSearchTree) -> Vec<Interval> {
        fn walk(tree: &IntervalSearchTree, h: Option<NodeId>, out: &mut Vec<Interval>) {
            let Some(id) = h else { return };
            out.push(tree.nodes[id].interval);
            walk(tree, tree.nodes[id].left, out);
            walk(tree, tree.nodes[id].right, out);
        }

        let mut out = Vec::new();
        walk(tree, tree.root, &mut out);
        out
    }

    #[test]
    fn identical_seeds_build_identical_shapes() {
        let build = |seed| {
            let mut tree = IntervalSearchTree::with_seed(seed);
            for row in 0..32usize {
                let lo = f64::from(u32::try_from(row % 7).unwrap());
                tree.add(interval(lo, lo + 3.0), row);
            }
            tree
        };

        assert_eq!(preorder(&build(42)), preorder(&build(42)));
        check_invariants(&build(42));
    }

    /// Reference implementation: linear scan over a list of pairs.
    #[derive(Default)]
    struct Oracle {
        pairs: Vec<(Interval, usize)>,
    }

    impl Oracle {
        fn add(&mut self, iv: Interval, row: usize) {
            self.pairs.push((iv, row));
        }

        fn remove(&mut self, iv: &Interval, row: usize) {
            if let Some(pos) = self.pairs.iter().position(|(i, r)| i == iv && *r == row) {
                self.pairs.swap_remove(pos);
            }
        }

        fn stab(&self, p: Float64) -> BTreeSet<usize> {
            self.pairs
                .iter()
                .filter(|(i, _)| i.contains(p))
                .map(|(_, r)| *r)
                .collect()
        }

        fn search_all(&self, q: &Interval) -> BTreeSet<usize> {
            self.pairs
                .iter()
                .filter(|(i, _)| i.intersects(q))
                .map(|(_, r)| *r)
                .collect()
        }
    }

    fn arb_interval() -> impl Strategy<Value = Interval> {
        (0i32..40, 0i32..12).prop_map(|(lo, span)| {
            interval(f64::from(lo) / 2.0, f64::from(lo + span) / 2.0)
        })
    }

    proptest! {
        #[test]
        fn random_add_remove_preserves_invariants_and_answers(
            ops in prop::collection::vec((arb_interval(), 0usize..24, any::<bool>()), 1..80),
            probes in prop::collection::vec(0i32..90, 1..8),
            seed in any::<u64>(),
        ) {
            let mut tree = IntervalSearchTree::with_seed(seed);
            let mut oracle = Oracle::default();

            for (iv, row, is_add) in ops {
                if is_add {
                    tree.add(iv, row);
                    oracle.add(iv, row);
                } else {
                    tree.remove(&iv, row);
                    oracle.remove(&iv, row);
                }
                check_invariants(&tree);
            }

            for probe in probes {
                let p = point(f64::from(probe) / 4.0);
                let got: BTreeSet<usize> = tree.stab(p).into_iter().collect();
                prop_assert_eq!(got, oracle.stab(p));

                let q = interval(f64::from(probe) / 4.0, f64::from(probe) / 4.0 + 2.0);
                let got: BTreeSet<usize> = tree.search_all(&q).into_iter().collect();
                prop_assert_eq!(got, oracle.search_all(&q));
            }
        }
    }
}
