//! The clause pool: an append-only arena with tombstone deletion and
//! periodic index-rewriting compaction, plus the per-literal watch lists
//! that index into it.
pub mod watch;

use crate::types::{ClauseId, Lit};
use watch::{WatchEntry, WatchList, WatchListIF};

bitflags! {
    #[derive(Default)]
    pub struct ClauseFlags: u8 {
        const LEARNT = 0b0001;
        const DEAD   = 0b0010;
    }
}

/// A clause: its literals plus one auxiliary word whose meaning depends on
/// the clause's kind — a floating activity for learned clauses, or a
/// variable-set signature (for subsumption pruning) on problem clauses.
#[derive(Clone, Debug)]
pub struct Clause {
    pub lits: Vec<Lit>,
    pub flags: ClauseFlags,
    pub activity: f32,
    /// LBD at creation time (learned clauses only; meaningless otherwise).
    pub rank: usize,
    /// Variable-set signature, lazily computed and cached for subsumption.
    pub signature: u32,
}

impl Clause {
    fn new(lits: Vec<Lit>, learnt: bool) -> Clause {
        let mut flags = ClauseFlags::default();
        if learnt {
            flags |= ClauseFlags::LEARNT;
        }
        Clause {
            lits,
            flags,
            activity: 0.0,
            rank: 0,
            signature: 0,
        }
    }

    #[inline]
    pub fn is_learnt(&self) -> bool {
        self.flags.contains(ClauseFlags::LEARNT)
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.flags.contains(ClauseFlags::DEAD)
    }

    pub fn compute_signature(&mut self) {
        let mut sig = 0u32;
        for l in &self.lits {
            sig |= 1 << (l.vi() % 32);
        }
        self.signature = sig;
    }
}

/// Remap produced by `compact`: old index -> new index, or `None` if the
/// clause was a tombstone and is now gone.
pub type CompactionMap = Vec<Option<ClauseId>>;

/// The clause arena plus watch-list storage for every literal.
pub struct ClauseDb {
    clauses: Vec<Clause>,
    /// First index at or above which every live clause is learned.
    learned_boundary: usize,
    watches: Vec<WatchList>,
    pub num_problem_clauses: usize,
    pub num_problem_literals: usize,
    pub num_learned_literals: usize,
    pub num_garbage: usize,
    clause_act_increment: f32,
    clause_inv_decay: f32,
}

impl ClauseDb {
    pub fn new(num_vars: usize) -> ClauseDb {
        ClauseDb {
            clauses: Vec::new(),
            learned_boundary: 0,
            watches: vec![Vec::new(); 2 * (num_vars + 1)],
            num_problem_clauses: 0,
            num_problem_literals: 0,
            num_learned_literals: 0,
            num_garbage: 0,
            clause_act_increment: 1.0,
            clause_inv_decay: 1.0,
        }
    }

    pub fn set_clause_decay(&mut self, decay: f64) {
        self.clause_inv_decay = (1.0 / decay) as f32;
    }

    /// Bump a learned clause's activity by the current increment, rescaling
    /// every learned clause's activity (and the increment itself) if it
    /// would otherwise overflow. Mirrors `VarActivityHeap::bump`, just
    /// without a heap to percolate since reduction re-sorts from scratch.
    pub fn bump_learned_activity(&mut self, cid: ClauseId) {
        self.clauses[cid].activity += self.clause_act_increment;
        if self.clauses[cid].activity > 1e20 {
            self.rescale_activities();
            self.clause_act_increment *= 1e-20;
        }
    }

    pub fn decay_clause_activity(&mut self) {
        self.clause_act_increment *= self.clause_inv_decay;
    }

    pub fn ensure_vars(&mut self, num_vars: usize) {
        let need = 2 * (num_vars + 1);
        if self.watches.len() < need {
            self.watches.resize(need, Vec::new());
        }
    }

    #[inline]
    pub fn watches(&self, l: Lit) -> &WatchList {
        &self.watches[l.index()]
    }

    #[inline]
    pub fn watches_mut(&mut self, l: Lit) -> &mut WatchList {
        &mut self.watches[l.index()]
    }

    /// Temporarily take a literal's watch list out, to be scanned and
    /// rebuilt without aliasing the lists of other literals that new
    /// entries are pushed into during the same scan.
    #[inline]
    pub fn take_watches(&mut self, l: Lit) -> WatchList {
        std::mem::take(&mut self.watches[l.index()])
    }

    #[inline]
    pub fn restore_watches(&mut self, l: Lit, w: WatchList) {
        self.watches[l.index()] = w;
    }

    #[inline]
    pub fn get(&self, cid: ClauseId) -> &Clause {
        &self.clauses[cid]
    }

    #[inline]
    pub fn get_mut(&mut self, cid: ClauseId) -> &mut Clause {
        &mut self.clauses[cid]
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn first_learned(&self) -> usize {
        self.learned_boundary
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn iter_with_id(&self) -> impl Iterator<Item = (ClauseId, &Clause)> {
        self.clauses.iter().enumerate()
    }

    /// Register the two watches of a freshly built clause of length >= 3.
    fn attach(&mut self, cid: ClauseId) {
        let (l0, l1) = {
            let c = &self.clauses[cid];
            (c.lits[0], c.lits[1])
        };
        self.watches_mut(l0).register_clause(cid, l1);
        self.watches_mut(l1).register_clause(cid, l0);
    }

    /// Add a problem (non-learned) clause of any length >= 2. Binary
    /// clauses are stored in the pool too (so preprocessing can rewrite
    /// them uniformly) but also materialized as inline binary watches.
    pub fn add_problem(&mut self, lits: Vec<Lit>) -> ClauseId {
        debug_assert!(self.learned_boundary == self.clauses.len(), "problem clauses must precede learned ones");
        let len = lits.len();
        let mut c = Clause::new(lits, false);
        c.compute_signature();
        let cid = self.clauses.len();
        self.clauses.push(c);
        self.learned_boundary = self.clauses.len();
        self.num_problem_clauses += 1;
        self.num_problem_literals += len;
        if len == 2 {
            let (l0, l1) = (self.clauses[cid].lits[0], self.clauses[cid].lits[1]);
            self.watches_mut(l0).register_binary(l1);
            self.watches_mut(l1).register_binary(l0);
        } else {
            self.attach(cid);
        }
        cid
    }

    /// Add a learned clause of length >= 3 (binary/unit learned clauses are
    /// installed directly onto the trail by the caller and never reach the
    /// pool as a distinct index).
    pub fn add_learned(&mut self, lits: Vec<Lit>, lbd: usize) -> ClauseId {
        let len = lits.len();
        let mut c = Clause::new(lits, true);
        c.rank = lbd;
        c.activity = 0.0;
        let cid = self.clauses.len();
        self.clauses.push(c);
        self.num_learned_literals += len;
        self.attach(cid);
        cid
    }

    pub fn bump_activity(&mut self, cid: ClauseId, bump: f32) {
        self.clauses[cid].activity += bump;
    }

    pub fn rescale_activities(&mut self) {
        for c in self.clauses.iter_mut().skip(self.learned_boundary) {
            c.activity *= 1e-20;
        }
    }

    /// Tombstone a clause: its slot is reclaimed at the next `compact`.
    pub fn delete(&mut self, cid: ClauseId) {
        let c = &mut self.clauses[cid];
        if c.is_dead() {
            return;
        }
        c.flags |= ClauseFlags::DEAD;
        self.num_garbage += c.lits.len();
        if c.is_learnt() {
            self.num_learned_literals -= c.lits.len();
        } else {
            self.num_problem_clauses -= 1;
            self.num_problem_literals -= c.lits.len();
        }
        let lits = c.lits.clone();
        if lits.len() == 2 {
            self.watches_mut(lits[0]).detach_binary(lits[1]);
            self.watches_mut(lits[1]).detach_binary(lits[0]);
        } else if lits.len() >= 3 {
            self.watches_mut(lits[0]).detach_clause(cid);
            self.watches_mut(lits[1]).detach_clause(cid);
        }
    }

    /// Shrink a live clause in place (used by top-level simplification and
    /// self-subsuming resolution). Re-attaches watches if the watched
    /// literals changed.
    pub fn shrink(&mut self, cid: ClauseId, new_lits: Vec<Lit>) {
        let old_watched = {
            let c = &self.clauses[cid];
            (c.lits.get(0).copied(), c.lits.get(1).copied(), c.lits.len())
        };
        if let (Some(l0), Some(l1), old_len) = old_watched {
            if old_len == 2 {
                self.watches_mut(l0).detach_binary(l1);
                self.watches_mut(l1).detach_binary(l0);
            } else {
                self.watches_mut(l0).detach_clause(cid);
                self.watches_mut(l1).detach_clause(cid);
            }
        }
        let is_learnt = self.clauses[cid].is_learnt();
        if is_learnt {
            self.num_learned_literals = self.num_learned_literals + new_lits.len()
                - self.clauses[cid].lits.len();
        } else {
            self.num_problem_literals = self.num_problem_literals + new_lits.len()
                - self.clauses[cid].lits.len();
        }
        self.clauses[cid].lits = new_lits;
        self.clauses[cid].compute_signature();
        match self.clauses[cid].lits.len() {
            0 | 1 => {}
            2 => {
                let (l0, l1) = (self.clauses[cid].lits[0], self.clauses[cid].lits[1]);
                self.watches_mut(l0).register_binary(l1);
                self.watches_mut(l1).register_binary(l0);
            }
            _ => self.attach(cid),
        }
    }

    /// Clear and rebuild every watch list from the current clause pool.
    /// The preprocessor doesn't keep `ClauseDb`'s watch lists in sync (it
    /// works over its own occurrence lists, the "simpler flat-index form"
    /// of SPEC_FULL.md §3); this is the one-shot rebuild run when
    /// preprocessing hands off to search (SPEC_FULL.md §4.9, "on exit").
    pub fn rebuild_watches(&mut self) {
        for list in self.watches.iter_mut() {
            list.clear();
        }
        for cid in 0..self.clauses.len() {
            if self.clauses[cid].is_dead() {
                continue;
            }
            let len = self.clauses[cid].lits.len();
            if len < 2 {
                continue;
            }
            if len == 2 {
                let (l0, l1) = (self.clauses[cid].lits[0], self.clauses[cid].lits[1]);
                self.watches_mut(l0).register_binary(l1);
                self.watches_mut(l1).register_binary(l0);
            } else {
                self.attach(cid);
            }
        }
        for list in self.watches.iter_mut() {
            if list.capacity() > 16 && list.len() * 4 < list.capacity() {
                list.shrink_to_fit();
            }
        }
    }

    /// Compact the pool: slide live clauses down, drop tombstones, and
    /// return the index remap so callers can fix up every outstanding
    /// `ClauseId` (watch entries are rebuilt here; antecedents are the
    /// caller's responsibility).
    pub fn compact(&mut self) -> CompactionMap {
        let mut remap: CompactionMap = vec![None; self.clauses.len()];
        let mut kept = Vec::with_capacity(self.clauses.len());
        let mut new_boundary = 0;
        for (old, c) in self.clauses.drain(..).enumerate() {
            if c.is_dead() {
                continue;
            }
            let new_id = kept.len();
            remap[old] = Some(new_id);
            if old < self.learned_boundary {
                new_boundary = kept.len() + 1;
            }
            kept.push(c);
        }
        self.clauses = kept;
        self.learned_boundary = new_boundary;
        self.num_garbage = 0;
        for list in self.watches.iter_mut() {
            list.retain_mut(|w| match w {
                WatchEntry::Binary(_) => true,
                WatchEntry::Clause { cid, .. } => match remap[*cid] {
                    Some(new_id) => {
                        *cid = new_id;
                        true
                    }
                    None => false,
                },
            });
        }
        remap
    }
}
