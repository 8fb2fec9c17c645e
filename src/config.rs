//! Solver configuration. A plain data record constructed programmatically;
//! no file or CLI flag parsing lives in this crate (out of scope).

/// Tunables for branching, clause-database maintenance, restarts and the
/// preprocessor. All fields have reasonable defaults; use the `with_*`
/// builders to override selectively.
#[derive(Clone, Debug)]
pub struct Config {
    /// Variable activity decay factor, applied after every conflict.
    pub var_decay: f64,
    /// Learned-clause activity decay factor.
    pub clause_decay: f64,
    /// Probability of a uniformly random decision instead of the top of
    /// the activity heap.
    pub randomness: f64,
    /// Seed for the branching PRNG.
    pub seed: u64,
    /// Clauses at or below this length or this LBD are never reduced away.
    pub keep_lbd: usize,
    /// Initial number of conflicts before the first reduction.
    pub reduce_init: usize,
    /// Amount `reduce_next` grows by after each reduction.
    pub reduce_inc: usize,
    /// Amount `reduce_inc` itself grows by (decaying toward 0).
    pub reduce_inc2: usize,
    /// Fraction (numerator over 32) of sorted learned clauses dropped per reduction.
    pub reduce_fraction: usize,
    /// Conflicts between forced restarts, added to `restart_next` each time.
    pub restart_interval: usize,
    /// Window size of the fast LBD EMA.
    pub restart_ema_fast: usize,
    /// Window size of the slow LBD EMA.
    pub restart_ema_slow: usize,
    /// Conflict budget enforced by `solve`; `0` means unbounded.
    pub conflict_budget: usize,
    /// Variables with `min(pos_occ, neg_occ)` at or above this are skipped
    /// by bounded variable elimination.
    pub var_elim_skip: usize,
    /// Clauses whose candidate watch list exceeds this length are skipped
    /// by subsumption.
    pub subsume_skip: usize,
    /// Resolvents longer than this are rejected during variable elimination.
    pub res_clause_limit: usize,
    /// Growth in level-0 facts/binaries required to trigger another simplify pass.
    pub simplify_cadence: usize,
    /// Run the preprocessor once before search.
    pub preprocess: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            var_decay: 0.95,
            clause_decay: 0.999,
            randomness: 0.0,
            seed: 0xDEAD_BEEF,
            keep_lbd: 3,
            reduce_init: 2000,
            reduce_inc: 300,
            reduce_inc2: 300,
            reduce_fraction: 16,
            restart_interval: 100,
            restart_ema_fast: 32,    // 2^5
            restart_ema_slow: 65536, // 2^16
            conflict_budget: 0,
            var_elim_skip: 10,
            subsume_skip: 1000,
            res_clause_limit: 100,
            simplify_cadence: 1,
            preprocess: true,
        }
    }
}

impl Config {
    pub fn with_var_decay(mut self, v: f64) -> Self {
        self.var_decay = v;
        self
    }
    pub fn with_clause_decay(mut self, v: f64) -> Self {
        self.clause_decay = v;
        self
    }
    pub fn with_randomness(mut self, v: f64) -> Self {
        self.randomness = v;
        self
    }
    pub fn with_seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }
    pub fn with_keep_lbd(mut self, v: usize) -> Self {
        self.keep_lbd = v;
        self
    }
    pub fn with_reduce_cadence(mut self, init: usize, inc: usize, inc2: usize) -> Self {
        self.reduce_init = init;
        self.reduce_inc = inc;
        self.reduce_inc2 = inc2;
        self
    }
    pub fn with_restart_interval(mut self, v: usize) -> Self {
        self.restart_interval = v;
        self
    }
    pub fn with_conflict_budget(mut self, v: usize) -> Self {
        self.conflict_budget = v;
        self
    }
    pub fn with_var_elim_skip(mut self, v: usize) -> Self {
        self.var_elim_skip = v;
        self
    }
    pub fn with_subsume_skip(mut self, v: usize) -> Self {
        self.subsume_skip = v;
        self
    }
    pub fn with_res_clause_limit(mut self, v: usize) -> Self {
        self.res_clause_limit = v;
        self
    }
    pub fn with_simplify_cadence(mut self, v: usize) -> Self {
        self.simplify_cadence = v;
        self
    }
    pub fn with_preprocess(mut self, v: bool) -> Self {
        self.preprocess = v;
        self
    }
}
