//! Per-literal watch lists.
use crate::types::{ClauseId, Lit};

/// One entry of a literal's watch list: either an inline binary clause
/// (the other literal, nothing more to look up) or a pointer into the
/// clause pool plus a cached blocker literal that lets propagation skip
/// loading the clause entirely when the blocker is already satisfied.
#[derive(Clone, Copy, Debug)]
pub enum WatchEntry {
    Binary(Lit),
    Clause { cid: ClauseId, blocker: Lit },
}

impl WatchEntry {
    #[inline]
    pub fn clause_id(self) -> Option<ClauseId> {
        match self {
            WatchEntry::Clause { cid, .. } => Some(cid),
            WatchEntry::Binary(_) => None,
        }
    }
}

/// The watch list of a single literal.
pub type WatchList = Vec<WatchEntry>;

/// API for a literal's watch list: register, detach, and blocker update.
/// Grounded on the teacher's `WatchDBIF` (`register`/`detach`/`detach_with`/
/// `update_blocker`), extended with the binary/clause discrimination this
/// specification requires.
pub trait WatchListIF {
    fn register_binary(&mut self, other: Lit);
    fn register_clause(&mut self, cid: ClauseId, blocker: Lit);
    /// O(1): remove the n-th entry via swap_remove.
    fn detach(&mut self, n: usize);
    /// O(len): remove the entry for clause `cid`, if present.
    fn detach_clause(&mut self, cid: ClauseId);
    /// O(len): remove the inline binary entry watching `other`, if present.
    fn detach_binary(&mut self, other: Lit);
    fn update_blocker(&mut self, cid: ClauseId, blocker: Lit);
}

impl WatchListIF for WatchList {
    fn register_binary(&mut self, other: Lit) {
        self.push(WatchEntry::Binary(other));
    }
    fn register_clause(&mut self, cid: ClauseId, blocker: Lit) {
        self.push(WatchEntry::Clause { cid, blocker });
    }
    fn detach(&mut self, n: usize) {
        self.swap_remove(n);
    }
    fn detach_clause(&mut self, cid: ClauseId) {
        if let Some(pos) = self.iter().position(|w| w.clause_id() == Some(cid)) {
            self.swap_remove(pos);
        }
    }
    fn detach_binary(&mut self, other: Lit) {
        if let Some(pos) = self.iter().position(|w| matches!(w, WatchEntry::Binary(l) if *l == other)) {
            self.swap_remove(pos);
        }
    }
    fn update_blocker(&mut self, cid: ClauseId, blocker: Lit) {
        for w in self.iter_mut() {
            if let WatchEntry::Clause { cid: c, blocker: b } = w {
                if *c == cid {
                    *b = blocker;
                    return;
                }
            }
        }
    }
}
