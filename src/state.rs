//! Solver-wide counters and the `log`-based progress reporting that reads
//! them. Replaces the teacher's chrono/`println!`-based `SolverState`: this
//! specification carries no console surface, so every progress signal goes
//! through `log::{trace,debug,info,warn}` instead (SPEC_FULL.md §10.1).

/// A single named counter, kept for callers that want to address a specific
/// statistic by name (mirrors the teacher's `Stat` enum) without exposing a
/// `Vec<i64>` indexed by it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stat {
    Conflict,
    Decision,
    Propagation,
    Restart,
    Reduction,
    Simplification,
    LearnedBinary,
    LearnedLbd2,
}

/// Diagnostic counters accumulated over a `solve()` call. None of these
/// feed back into solver heuristics (SPEC_FULL.md §9's open question on
/// `simplify_calls`/`successful_dive`-style counters); they exist purely to
/// be logged.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    pub conflicts: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub restarts: usize,
    pub reductions: usize,
    pub simplifications: usize,
    pub learned_binary: usize,
    pub learned_lbd2: usize,
    pub sum_lbd: usize,
    pub eliminated_vars: usize,
    pub substituted_vars: usize,
}

impl Stats {
    pub fn bump(&mut self, s: Stat) {
        match s {
            Stat::Conflict => self.conflicts += 1,
            Stat::Decision => self.decisions += 1,
            Stat::Propagation => self.propagations += 1,
            Stat::Restart => self.restarts += 1,
            Stat::Reduction => self.reductions += 1,
            Stat::Simplification => self.simplifications += 1,
            Stat::LearnedBinary => self.learned_binary += 1,
            Stat::LearnedLbd2 => self.learned_lbd2 += 1,
        }
    }

    pub fn record_learnt(&mut self, lbd: usize, len: usize) {
        self.sum_lbd += lbd;
        if len == 2 {
            self.bump(Stat::LearnedBinary);
        }
        if lbd == 2 {
            self.bump(Stat::LearnedLbd2);
        }
    }

    pub fn average_lbd(&self) -> f64 {
        if self.conflicts == 0 {
            0.0
        } else {
            self.sum_lbd as f64 / self.conflicts as f64
        }
    }

    /// Emitted once per `solve()` call (SPEC_FULL.md §10.1: "`info!` once
    /// per `solve()` call with a summary").
    pub fn log_summary(&self, num_vars: usize, result: &str) {
        log::info!(
            "solve finished: result={} vars={} conflicts={} decisions={} propagations={} \
             restarts={} reductions={} simplifications={} avg_lbd={:.2} elim={} subst={}",
            result,
            num_vars,
            self.conflicts,
            self.decisions,
            self.propagations,
            self.restarts,
            self.reductions,
            self.simplifications,
            self.average_lbd(),
            self.eliminated_vars,
            self.substituted_vars,
        );
    }
}
