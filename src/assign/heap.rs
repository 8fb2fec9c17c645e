//! Variable activity max-heap used for branching.
use crate::types::{Prng, VarId};

/// Max-heap over variable activity. `heap[pos[v]] == v` is the invariant
/// linking the heap array to its position index; `heap` is a binary heap
/// array (root at index 0) ordered so every parent's activity is >= both
/// children's. Grounded on the teacher's `VarIdHeap`
/// (`percolate_up`/`percolate_down`/`get_root`).
pub struct VarActivityHeap {
    activity: Vec<f64>,
    heap: Vec<VarId>,
    pos: Vec<Option<usize>>,
    act_increment: f64,
    inv_decay: f64,
}

impl VarActivityHeap {
    pub fn new(num_vars: usize, decay: f64) -> VarActivityHeap {
        let mut h = VarActivityHeap {
            activity: vec![0.0; num_vars + 1],
            heap: Vec::with_capacity(num_vars + 1),
            pos: vec![None; num_vars + 1],
            act_increment: 1.0,
            inv_decay: 1.0 / decay,
        };
        for v in 1..=num_vars {
            h.insert(v);
        }
        h
    }

    pub fn ensure_vars(&mut self, num_vars: usize) {
        if self.activity.len() <= num_vars {
            self.activity.resize(num_vars + 1, 0.0);
            self.pos.resize(num_vars + 1, None);
        }
    }

    pub fn activity(&self, v: VarId) -> f64 {
        self.activity[v]
    }

    pub fn contains(&self, v: VarId) -> bool {
        self.pos[v].is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Bump `v`'s activity by the current increment and sift it toward the
    /// root if present in the heap; rescale everything if any activity
    /// would overflow.
    pub fn bump(&mut self, v: VarId) {
        self.activity[v] += self.act_increment;
        if self.activity[v] > 1e100 {
            for a in self.activity.iter_mut() {
                *a *= 1e-100;
            }
            self.act_increment *= 1e-100;
        }
        if let Some(p) = self.pos[v] {
            self.percolate_up(p);
        }
    }

    pub fn decay(&mut self) {
        self.act_increment *= self.inv_decay;
    }

    /// Change the decay rate going forward (`set_var_decay`, SPEC_FULL.md §6).
    pub fn set_decay(&mut self, decay: f64) {
        self.inv_decay = 1.0 / decay;
    }

    /// The variable currently at the root, without removing it.
    pub fn peek(&self) -> Option<VarId> {
        self.heap.first().copied()
    }

    /// A uniformly random variable still in the heap, for the `randomness`
    /// branching rule (SPEC_FULL.md §4.4). Unlike `pop`, this doesn't
    /// remove anything.
    pub fn random_active(&self, prng: &mut Prng) -> Option<VarId> {
        if self.heap.is_empty() {
            return None;
        }
        let idx = prng.next_below(self.heap.len() as u32) as usize;
        Some(self.heap[idx])
    }

    /// Drop every entry for which `keep` is false. Used once, right after
    /// preprocessing, to exclude variables preprocessing fixed or
    /// eliminated from ever being offered as a decision.
    pub fn retain_active(&mut self, keep: impl Fn(VarId) -> bool) {
        let drop: Vec<VarId> = self.heap.iter().copied().filter(|&v| !keep(v)).collect();
        for v in drop {
            self.remove(v);
        }
    }

    /// Insert `v` back into the heap (used at construction and when
    /// backtracking unassigns a variable).
    pub fn insert(&mut self, v: VarId) {
        if self.pos[v].is_some() {
            return;
        }
        let p = self.heap.len();
        self.heap.push(v);
        self.pos[v] = Some(p);
        self.percolate_up(p);
    }

    /// Remove `v` from the heap if present, without popping it. Used to
    /// drop variables preprocessing has eliminated or already assigned so
    /// they're never offered as a decision.
    pub fn remove(&mut self, v: VarId) {
        if let Some(p) = self.pos[v] {
            let last = self.heap.len() - 1;
            self.heap.swap(p, last);
            self.pos[self.heap[p]] = Some(p);
            self.heap.pop();
            self.pos[v] = None;
            if p < self.heap.len() {
                self.percolate_up(p);
                self.percolate_down(p);
            }
        }
    }

    /// Pop the highest-activity variable.
    pub fn pop(&mut self) -> Option<VarId> {
        if self.heap.is_empty() {
            return None;
        }
        let root = self.heap[0];
        let last = self.heap.pop().unwrap();
        self.pos[root] = None;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.pos[last] = Some(0);
            self.percolate_down(0);
        }
        Some(root)
    }

    fn percolate_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.activity[self.heap[parent]] >= self.activity[self.heap[i]] {
                break;
            }
            self.heap.swap(parent, i);
            self.pos[self.heap[i]] = Some(i);
            self.pos[self.heap[parent]] = Some(parent);
            i = parent;
        }
    }

    fn percolate_down(&mut self, mut i: usize) {
        let n = self.heap.len();
        loop {
            let l = 2 * i + 1;
            let r = 2 * i + 2;
            let mut largest = i;
            if l < n && self.activity[self.heap[l]] > self.activity[self.heap[largest]] {
                largest = l;
            }
            if r < n && self.activity[self.heap[r]] > self.activity[self.heap[largest]] {
                largest = r;
            }
            if largest == i {
                break;
            }
            self.heap.swap(i, largest);
            self.pos[self.heap[i]] = Some(i);
            self.pos[self.heap[largest]] = Some(largest);
            i = largest;
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariant(&self) -> bool {
        for (i, &v) in self.heap.iter().enumerate() {
            if self.pos[v] != Some(i) {
                return false;
            }
            let l = 2 * i + 1;
            let r = 2 * i + 2;
            if l < self.heap.len() && self.activity[v] < self.activity[self.heap[l]] {
                return false;
            }
            if r < self.heap.len() && self.activity[v] < self.activity[self.heap[r]] {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_activity_order() {
        let mut h = VarActivityHeap::new(5, 0.95);
        for _ in 0..3 {
            h.bump(2);
        }
        h.bump(4);
        assert!(h.check_invariant());
        assert_eq!(h.pop(), Some(2));
        assert!(h.check_invariant());
        assert_eq!(h.pop(), Some(4));
    }

    #[test]
    fn reinsert_after_pop() {
        let mut h = VarActivityHeap::new(3, 0.95);
        let v = h.pop().unwrap();
        assert!(!h.contains(v));
        h.insert(v);
        assert!(h.contains(v));
        assert!(h.check_invariant());
    }
}
