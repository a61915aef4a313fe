//! The DFA input model: one automaton per preference level, produced by
//! the regex compiler upstream.
//!
//! Transition keys group locations into symbol sets; the builder expands
//! them into a flat per-location table once, then steps through it with
//! cheap lookups.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A deterministic automaton over router locations.
#[derive(Debug, Clone)]
pub struct Dfa {
    pub q0: u32,
    pub finals: FxHashSet<u32>,
    /// Transition function keyed by (state, location set).
    pub trans: FxHashMap<(u32, BTreeSet<String>), u32>,
}

impl Dfa {
    /// Build from per-location edges; each edge covers a single symbol.
    pub fn from_edges(q0: u32, finals: &[u32], edges: &[(u32, &str, u32)]) -> Self {
        let mut trans = FxHashMap::default();
        for &(q, loc, q2) in edges {
            let mut syms = BTreeSet::new();
            syms.insert(loc.to_string());
            trans.insert((q, syms), q2);
        }
        Dfa {
            q0,
            finals: finals.iter().copied().collect(),
            trans,
        }
    }
}

/// A DFA expanded to a flat per-location transition table, with its
/// garbage states precomputed.
pub(crate) struct FlatDfa {
    pub q0: u32,
    finals: FxHashSet<u32>,
    table: FxHashMap<(u32, Arc<str>), u32>,
    garbage: FxHashSet<u32>,
}

impl FlatDfa {
    pub fn expand(dfa: &Dfa) -> Self {
        let mut table: FxHashMap<(u32, Arc<str>), u32> = FxHashMap::default();
        for ((q, syms), &q2) in &dfa.trans {
            for s in syms {
                table.insert((*q, Arc::from(s.as_str())), q2);
            }
        }

        // A garbage state only ever transitions to itself and never
        // accepts, so reaching one ends the automaton's contribution.
        let mut succs: FxHashMap<u32, FxHashSet<u32>> = FxHashMap::default();
        let mut states: FxHashSet<u32> = FxHashSet::default();
        states.insert(dfa.q0);
        for (&(q, _), &q2) in &table {
            succs.entry(q).or_default().insert(q2);
            states.insert(q);
            states.insert(q2);
        }
        let garbage = states
            .iter()
            .copied()
            .filter(|q| {
                !dfa.finals.contains(q)
                    && succs
                        .get(q)
                        .is_some_and(|out| out.len() == 1 && out.contains(q))
            })
            .collect();

        FlatDfa {
            q0: dfa.q0,
            finals: dfa.finals.clone(),
            table,
            garbage,
        }
    }

    /// One transition step, `None` when no transition is defined.
    #[inline]
    pub fn step(&self, q: u32, loc: &Arc<str>) -> Option<u32> {
        self.table.get(&(q, Arc::clone(loc))).copied()
    }

    #[inline]
    pub fn is_final(&self, q: u32) -> bool {
        self.finals.contains(&q)
    }

    #[inline]
    pub fn is_garbage(&self, q: u32) -> bool {
        self.garbage.contains(&q)
    }
}
