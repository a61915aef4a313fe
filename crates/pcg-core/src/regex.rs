//! Regular-expression extraction from the product graph.
//!
//! A small regex algebra over router locations plus the classical
//! state-elimination algorithm: paths are collected between Start and an
//! artificial ε edge into End placed at the state of interest.

use crate::pcg::{Pcg, END_ID, START_ID};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A regular expression over router locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Re {
    Empty,
    Epsilon,
    Loc(Arc<str>),
    Concat(Box<Re>, Box<Re>),
    Union(Box<Re>, Box<Re>),
    Star(Box<Re>),
}

impl Re {
    pub fn loc(l: &Arc<str>) -> Re {
        Re::Loc(Arc::clone(l))
    }

    /// `a · b`, absorbing ∅ and dropping ε units.
    pub fn concat(a: Re, b: Re) -> Re {
        match (a, b) {
            (Re::Empty, _) | (_, Re::Empty) => Re::Empty,
            (Re::Epsilon, r) | (r, Re::Epsilon) => r,
            (a, b) => Re::Concat(Box::new(a), Box::new(b)),
        }
    }

    /// `a | b`, with ∅ as the unit and identical branches merged.
    pub fn union(a: Re, b: Re) -> Re {
        match (a, b) {
            (Re::Empty, r) | (r, Re::Empty) => r,
            (a, b) if a == b => a,
            (a, b) => Re::Union(Box::new(a), Box::new(b)),
        }
    }

    /// `a*`; starring nothing (or ε) is ε, and `(a*)* = a*`.
    pub fn star(a: Re) -> Re {
        match a {
            Re::Empty | Re::Epsilon => Re::Epsilon,
            s @ Re::Star(_) => s,
            a => Re::Star(Box::new(a)),
        }
    }

    fn is_atomic(&self) -> bool {
        matches!(self, Re::Empty | Re::Epsilon | Re::Loc(_) | Re::Star(_))
    }
}

impl std::fmt::Display for Re {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Re::Empty => write!(f, "∅"),
            Re::Epsilon => write!(f, "ε"),
            Re::Loc(l) => write!(f, "{}", l),
            Re::Concat(a, b) => {
                for r in [a, b] {
                    if r.is_atomic() || matches!(**r, Re::Concat(_, _)) {
                        write!(f, "{}", r)?;
                    } else {
                        write!(f, "({})", r)?;
                    }
                }
                Ok(())
            }
            Re::Union(a, b) => write!(f, "({}|{})", a, b),
            Re::Star(a) => {
                if a.is_atomic() && !matches!(**a, Re::Star(_)) {
                    write!(f, "{}*", a)
                } else {
                    write!(f, "({})*", a)
                }
            }
        }
    }
}

/// Extract the regex of all paths reaching `state` from Start, each edge
/// contributing the location it enters.
///
/// Works on a private copy: the edges into End are replaced by a single
/// ε edge from `state`, every real node is eliminated in turn with the
/// update `R(q1,q2) ∪= R(q1,q) · R(q,q)* · R(q,q2)`, and the label left
/// between Start and End is the answer.
pub fn construct_regex(cg: &Pcg, state: u32) -> Re {
    let mut table: FxHashMap<(u32, u32), Re> = FxHashMap::default();
    let mut merge = |table: &mut FxHashMap<(u32, u32), Re>, key: (u32, u32), re: Re| {
        let cur = table.remove(&key).unwrap_or(Re::Empty);
        table.insert(key, Re::union(cur, re));
    };

    for (u, v) in cg.edges() {
        if v == END_ID {
            continue;
        }
        let label = Re::loc(cg.state(v).loc());
        merge(&mut table, (u, v), label);
    }
    merge(&mut table, (state, END_ID), Re::Epsilon);

    let mut order: Vec<u32> = cg
        .vertex_ids_sorted()
        .into_iter()
        .filter(|&v| v != START_ID && v != END_ID)
        .collect();
    order.sort_unstable();

    for q in order {
        let selfloop = table.remove(&(q, q)).unwrap_or(Re::Empty);
        let through = Re::star(selfloop);

        let ins: Vec<(u32, Re)> = table
            .iter()
            .filter(|((a, b), _)| *b == q && *a != q)
            .map(|(&(a, _), re)| (a, re.clone()))
            .collect();
        let outs: Vec<(u32, Re)> = table
            .iter()
            .filter(|((a, b), _)| *a == q && *b != q)
            .map(|(&(_, b), re)| (b, re.clone()))
            .collect();

        for (q1, r1) in &ins {
            for (q2, r2) in &outs {
                let detour = Re::concat(r1.clone(), Re::concat(through.clone(), r2.clone()));
                merge(&mut table, (*q1, *q2), detour);
            }
        }
        table.retain(|&(a, b), _| a != q && b != q);
    }

    table.remove(&(START_ID, END_ID)).unwrap_or(Re::Empty)
}
