//! KdTree implementation.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use super::kd_types::{Axis, IntegrityReport, Placement, SlotId, Slot, SpatialError, SpatialResult};

/// A two-dimensional k-d tree keyed by caller supplied identifiers.
///
/// Slots live in a dense arena and link to each other by arena index; a
/// key-to-slot map locates entries for removal and placement queries.
///
/// # Ordering
///
/// The root splits on `y` ([`Axis::Y`]) and the split axis flips at every
/// level. At each slot a point goes left iff its coordinate on that slot's
/// axis is strictly less than the slot's coordinate, so every left subtree
/// holds strictly smaller values and every right subtree holds values greater
/// than or equal to its parent's split value.
///
/// # Limits
///
/// The tree never rebalances. Sorted insertion orders produce a chain whose
/// height equals the number of entries, and queries degrade to O(n). All
/// traversals are iterative, so degenerate trees are slow but safe. Callers
/// are expected to supply finite coordinates.
pub struct KdTree<K> {
    slots: Vec<Slot<K>>,
    positions: HashMap<K, SlotId>,
    root: Option<SlotId>,
}

/// Heap entry for k-nearest searches, ordered by distance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance_squared: f64,
    slot: SlotId,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_squared
            .total_cmp(&other.distance_squared)
            .then(self.slot.cmp(&other.slot))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Half-open region `[lo, hi)` a subtree is confined to, indexed by axis.
#[derive(Clone, Copy)]
struct Region {
    lo: [f64; 2],
    hi: [f64; 2],
}

impl Region {
    fn unbounded() -> Self {
        Region {
            lo: [f64::NEG_INFINITY; 2],
            hi: [f64::INFINITY; 2],
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        [Axis::Y, Axis::X].iter().all(|axis| {
            let i = axis.index() as usize;
            let value = axis.coord(x, y);
            value >= self.lo[i] && value < self.hi[i]
        })
    }

    fn below(mut self, axis: Axis, split: f64) -> Self {
        let i = axis.index() as usize;
        self.hi[i] = self.hi[i].min(split);
        self
    }

    fn at_or_above(mut self, axis: Axis, split: f64) -> Self {
        let i = axis.index() as usize;
        self.lo[i] = self.lo[i].max(split);
        self
    }
}

impl<K> Default for KdTree<K>
where
    K: Copy + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KdTree<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tree with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        KdTree {
            slots: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            root: None,
        }
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Returns the coordinates stored for `key`.
    pub fn point(&self, key: &K) -> Option<(f64, f64)> {
        self.positions
            .get(key)
            .map(|&id| (self.slots[id].x, self.slots[id].y))
    }

    /// Iterates over all entries in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (K, f64, f64)> + '_ {
        self.slots.iter().map(|slot| (slot.key, slot.x, slot.y))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        log::debug!("Clearing k-d tree with {} entries", self.slots.len());
        self.slots.clear();
        self.positions.clear();
        self.root = None;
    }

    /// Number of levels on the longest root-to-leaf path (0 when empty).
    pub fn height(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };

        let mut height = 0;
        let mut stack = vec![(root, 1usize)];
        while let Some((id, level)) = stack.pop() {
            height = height.max(level);
            let slot = &self.slots[id];
            stack.extend(slot.left.iter().chain(slot.right.iter()).map(|&c| (c, level + 1)));
        }
        height
    }

    /// Returns the structural position of `key`.
    pub fn placement(&self, key: &K) -> Option<Placement<K>> {
        let &id = self.positions.get(key)?;
        let slot = &self.slots[id];

        let mut depth = 0;
        let mut cursor = slot.parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.slots[parent].parent;
        }

        Some(Placement {
            axis: slot.axis,
            depth,
            parent: slot.parent.map(|p| self.slots[p].key),
            left: slot.left.map(|c| self.slots[c].key),
            right: slot.right.map(|c| self.slots[c].key),
        })
    }

    /// Inserts `key` at `(x, y)` as a new leaf.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::DuplicateKey`] if the key is already indexed;
    /// the tree is left untouched.
    pub fn insert(&mut self, key: K, x: f64, y: f64) -> SpatialResult<()> {
        if self.positions.contains_key(&key) {
            log::error!("Rejecting insert of key {:?}: already indexed", key);
            return Err(SpatialError::DuplicateKey(format!("{:?}", key)));
        }

        let id = self.slots.len();
        let Some(root) = self.root else {
            self.slots.push(Slot {
                key,
                x,
                y,
                axis: Axis::ROOT,
                parent: None,
                left: None,
                right: None,
            });
            self.root = Some(id);
            self.positions.insert(key, id);
            return Ok(());
        };

        let mut current = root;
        loop {
            let slot = &self.slots[current];
            let go_left = slot.axis.coord(x, y) < slot.split_value();
            let next = if go_left { slot.left } else { slot.right };

            match next {
                Some(child) => current = child,
                None => {
                    let axis = slot.axis.flip();
                    self.slots.push(Slot {
                        key,
                        x,
                        y,
                        axis,
                        parent: Some(current),
                        left: None,
                        right: None,
                    });
                    let parent = &mut self.slots[current];
                    if go_left {
                        parent.left = Some(id);
                    } else {
                        parent.right = Some(id);
                    }
                    break;
                }
            }
        }

        self.positions.insert(key, id);
        Ok(())
    }

    /// Removes `key` and restructures the subtree below it.
    ///
    /// Returns the coordinates the key was stored at.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::KeyNotFound`] if the key is not indexed.
    pub fn remove(&mut self, key: &K) -> SpatialResult<(f64, f64)> {
        let id = self
            .positions
            .remove(key)
            .ok_or_else(|| SpatialError::KeyNotFound(format!("{:?}", key)))?;

        let removed = (self.slots[id].x, self.slots[id].y);
        self.delete_slot(id);
        Ok(removed)
    }

    /// Classic k-d deletion: the emptied slot takes over the entry with the
    /// minimum value on its axis from the right subtree (or from the left
    /// subtree, which then becomes the right one), and the donor slot is
    /// deleted in turn until a leaf is reached.
    fn delete_slot(&mut self, start: SlotId) {
        let mut target = start;
        loop {
            let (axis, left, right) = {
                let slot = &self.slots[target];
                (slot.axis, slot.left, slot.right)
            };

            let donor = match (left, right) {
                (_, Some(right)) => self.find_min(right, axis),
                (Some(left), None) => {
                    let donor = self.find_min(left, axis);
                    let slot = &mut self.slots[target];
                    slot.right = Some(left);
                    slot.left = None;
                    donor
                }
                (None, None) => {
                    self.detach_leaf(target);
                    return;
                }
            };

            self.adopt_entry(target, donor);
            target = donor;
        }
    }

    /// Finds the slot holding the minimum value on `axis` within a subtree.
    fn find_min(&self, subtree: SlotId, axis: Axis) -> SlotId {
        let mut best = subtree;
        let mut stack = vec![subtree];

        while let Some(id) = stack.pop() {
            let slot = &self.slots[id];
            let best_slot = &self.slots[best];
            if axis.coord(slot.x, slot.y) < axis.coord(best_slot.x, best_slot.y) {
                best = id;
            }

            if slot.axis == axis {
                // right side is never smaller than this slot
                stack.extend(slot.left);
            } else {
                stack.extend(slot.left);
                stack.extend(slot.right);
            }
        }
        best
    }

    /// Moves the entry stored in `donor` into `target`.
    fn adopt_entry(&mut self, target: SlotId, donor: SlotId) {
        let (key, x, y) = {
            let slot = &self.slots[donor];
            (slot.key, slot.x, slot.y)
        };
        let slot = &mut self.slots[target];
        slot.key = key;
        slot.x = x;
        slot.y = y;
        self.positions.insert(key, target);
    }

    fn detach_leaf(&mut self, id: SlotId) {
        match self.slots[id].parent {
            Some(parent) => {
                let parent = &mut self.slots[parent];
                if parent.left == Some(id) {
                    parent.left = None;
                } else {
                    parent.right = None;
                }
            }
            None => self.root = None,
        }
        self.release_slot(id);
    }

    /// Frees an unlinked slot, compacting the arena by moving the last slot
    /// into the hole and repointing every link to it.
    fn release_slot(&mut self, id: SlotId) {
        let last = self.slots.len() - 1;
        self.slots.swap_remove(id);
        if id == last {
            return;
        }

        let (key, parent, left, right) = {
            let moved = &self.slots[id];
            (moved.key, moved.parent, moved.left, moved.right)
        };

        match parent {
            Some(parent) => {
                let parent = &mut self.slots[parent];
                if parent.left == Some(last) {
                    parent.left = Some(id);
                } else if parent.right == Some(last) {
                    parent.right = Some(id);
                }
            }
            None => {
                if self.root == Some(last) {
                    self.root = Some(id);
                }
            }
        }
        for child in left.into_iter().chain(right) {
            self.slots[child].parent = Some(id);
        }
        if self.positions.get(&key) == Some(&last) {
            self.positions.insert(key, id);
        }
    }

    /// Finds the entry closest to `(x, y)`.
    ///
    /// Exact branch-and-bound search: the branch on the query's side of each
    /// split is visited first, and the other branch only while the squared
    /// distance to the splitting line is below the best distance found.
    ///
    /// Returns the key and its Euclidean distance, or `None` when empty.
    pub fn nearest(&self, x: f64, y: f64) -> Option<(K, f64)> {
        let root = self.root?;
        let mut best: Option<Candidate> = None;
        let mut stack = vec![(root, 0.0f64)];

        while let Some((id, bound)) = stack.pop() {
            if let Some(found) = best {
                if bound >= found.distance_squared {
                    continue;
                }
            }

            let slot = &self.slots[id];
            let distance_squared = slot.distance_squared(x, y);
            if best.map_or(true, |found| distance_squared < found.distance_squared) {
                best = Some(Candidate {
                    distance_squared,
                    slot: id,
                });
            }

            self.push_children(&mut stack, slot, x, y, bound);
        }

        best.map(|found| (self.slots[found.slot].key, found.distance_squared.sqrt()))
    }

    /// Finds up to `k` entries closest to `(x, y)`, nearest first.
    pub fn k_nearest(&self, x: f64, y: f64, k: usize) -> Vec<(K, f64)> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        let mut stack = vec![(root, 0.0f64)];

        while let Some((id, bound)) = stack.pop() {
            if heap.len() == k {
                if let Some(worst) = heap.peek() {
                    if bound >= worst.distance_squared {
                        continue;
                    }
                }
            }

            let slot = &self.slots[id];
            heap.push(Candidate {
                distance_squared: slot.distance_squared(x, y),
                slot: id,
            });
            if heap.len() > k {
                heap.pop();
            }

            self.push_children(&mut stack, slot, x, y, bound);
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| (self.slots[c.slot].key, c.distance_squared.sqrt()))
            .collect()
    }

    /// Finds every entry within `distance` of `(x, y)`, nearest first.
    pub fn within_distance(&self, x: f64, y: f64, distance: f64) -> Vec<(K, f64)> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if distance.is_nan() || distance < 0.0 {
            return Vec::new();
        }

        let limit = distance * distance;
        let mut found = Vec::new();
        let mut stack = vec![(root, 0.0f64)];

        while let Some((id, bound)) = stack.pop() {
            if bound > limit {
                continue;
            }

            let slot = &self.slots[id];
            let distance_squared = slot.distance_squared(x, y);
            if distance_squared <= limit {
                found.push(Candidate {
                    distance_squared,
                    slot: id,
                });
            }

            self.push_children(&mut stack, slot, x, y, bound);
        }

        found.sort();
        found
            .into_iter()
            .map(|c| (self.slots[c.slot].key, c.distance_squared.sqrt()))
            .collect()
    }

    /// Pushes the far child (bounded by the split distance) and then the near
    /// child, so the near side is searched first.
    #[inline]
    fn push_children(
        &self,
        stack: &mut Vec<(SlotId, f64)>,
        slot: &Slot<K>,
        x: f64,
        y: f64,
        bound: f64,
    ) {
        let diff = slot.axis.coord(x, y) - slot.split_value();
        let (near, far) = if diff < 0.0 {
            (slot.left, slot.right)
        } else {
            (slot.right, slot.left)
        };

        if let Some(far) = far {
            stack.push((far, bound.max(diff * diff)));
        }
        if let Some(near) = near {
            stack.push((near, bound));
        }
    }

    /// Walks the whole tree and verifies its structural invariants:
    /// parent links, axis alternation, the left/right ordering of every
    /// subtree and the key-to-slot map.
    pub fn check_integrity(&self) -> IntegrityReport {
        let mut report = IntegrityReport::new();

        let Some(root) = self.root else {
            if !self.slots.is_empty() || !self.positions.is_empty() {
                report.fail(format!(
                    "Empty tree still holds {} slots and {} keys",
                    self.slots.len(),
                    self.positions.len()
                ));
            }
            return report;
        };

        if self.slots[root].parent.is_some() {
            report.fail("Root slot has a parent link".to_string());
        }
        if self.slots[root].axis != Axis::ROOT {
            report.fail(format!("Root slot splits on {} instead of y", self.slots[root].axis));
        }

        let mut stack = vec![(root, 0usize, Region::unbounded())];
        while let Some((id, depth, region)) = stack.pop() {
            report.nodes_checked += 1;
            if report.nodes_checked > self.slots.len() {
                report.fail("Cycle detected in tree links".to_string());
                break;
            }
            report.max_depth = report.max_depth.max(depth);

            let slot = &self.slots[id];
            if !region.contains(slot.x, slot.y) {
                report.fail(format!(
                    "Key {:?} at ({}, {}) lies outside its subtree region",
                    slot.key, slot.x, slot.y
                ));
            }
            if self.positions.get(&slot.key) != Some(&id) {
                report.fail(format!("Key {:?} is not mapped to its slot", slot.key));
            }

            let split = slot.split_value();
            let children = [
                (slot.left, region.below(slot.axis, split)),
                (slot.right, region.at_or_above(slot.axis, split)),
            ];
            for (child, child_region) in children {
                let Some(child) = child else {
                    continue;
                };
                let child_slot = &self.slots[child];
                if child_slot.parent != Some(id) {
                    report.fail(format!(
                        "Key {:?} does not link back to parent {:?}",
                        child_slot.key, slot.key
                    ));
                }
                if child_slot.axis != slot.axis.flip() {
                    report.fail(format!(
                        "Key {:?} splits on {} under a parent splitting on {}",
                        child_slot.key, child_slot.axis, slot.axis
                    ));
                }
                stack.push((child, depth + 1, child_region));
            }
        }

        if report.nodes_checked != self.slots.len() {
            report.fail(format!(
                "{} slots reachable from the root, {} allocated",
                report.nodes_checked,
                self.slots.len()
            ));
        }
        if self.positions.len() != self.slots.len() {
            report.fail(format!(
                "{} keys mapped, {} slots allocated",
                self.positions.len(),
                self.slots.len()
            ));
        }

        report
    }
}

impl<K: Debug> Debug for KdTree<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdTree")
            .field("len", &self.slots.len())
            .field("root", &self.root.map(|r| &self.slots[r]))
            .finish()
    }
}
