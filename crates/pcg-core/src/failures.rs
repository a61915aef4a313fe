//! Failure analysis: enumerate node/link failures, materialize the
//! surviving graph, and approximate minimum cuts by repeated
//! shortest-path removal.

use crate::pcg::Pcg;
use crate::topology::Topology;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// A single point of failure: an inside router, or a link touching one.
/// Link endpoints are stored in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Failure {
    Node(Arc<str>),
    Link(Arc<str>, Arc<str>),
}

impl Failure {
    fn link(a: &Arc<str>, b: &Arc<str>) -> Failure {
        if a <= b {
            Failure::Link(Arc::clone(a), Arc::clone(b))
        } else {
            Failure::Link(Arc::clone(b), Arc::clone(a))
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Node(l) => write!(f, "node({})", l),
            Failure::Link(a, b) => write!(f, "link({},{})", a, b),
        }
    }
}

/// All failure combinations of size `n`: inside-node failures plus link
/// failures with at least one inside endpoint.
pub fn all_failures(n: usize, topo: &Topology) -> Vec<Vec<Failure>> {
    let mut singles: Vec<Failure> = Vec::new();
    for i in topo.vertices() {
        if topo.node(i).is_inside() {
            singles.push(Failure::Node(Arc::clone(topo.node(i).loc())));
        }
    }
    for (u, v) in topo.links() {
        if topo.node(u).is_inside() || topo.node(v).is_inside() {
            singles.push(Failure::link(topo.node(u).loc(), topo.node(v).loc()));
        }
    }
    singles.sort();
    singles.into_iter().combinations(n).collect()
}

/// The product graph surviving a set of failures: failed locations lose
/// their vertices, failed links lose their edges in both orientations.
pub fn failed_graph(cg: &Pcg, failures: &[Failure]) -> Pcg {
    let mut failed_locs: FxHashSet<Arc<str>> = FxHashSet::default();
    let mut failed_links: FxHashSet<(Arc<str>, Arc<str>)> = FxHashSet::default();
    for f in failures {
        match f {
            Failure::Node(l) => {
                failed_locs.insert(Arc::clone(l));
            }
            Failure::Link(a, b) => {
                failed_links.insert((Arc::clone(a), Arc::clone(b)));
                failed_links.insert((Arc::clone(b), Arc::clone(a)));
            }
        }
    }

    let mut out = cg.copy_graph();
    out.remove_states_if(|s| s.is_real() && failed_locs.contains(s.loc()));

    let doomed: Vec<(u32, u32)> = out
        .edges()
        .filter(|&(u, v)| {
            let key = (
                Arc::clone(out.state(u).loc()),
                Arc::clone(out.state(v).loc()),
            );
            failed_links.contains(&key)
        })
        .collect();
    for (u, v) in doomed {
        out.remove_edge(u, v);
    }
    out
}

/// Count how many shortest paths must be removed before `dst` becomes
/// unreachable from `src`; approximates the minimum edge cut.
pub fn disconnect(cg: &Pcg, src: u32, dst: u32) -> u32 {
    let mut cg = cg.copy_graph();
    let mut count = 0;
    while let Some(path) = cg.graph.shortest_path(src, dst) {
        if path.is_empty() {
            break;
        }
        for (u, v) in path {
            cg.remove_edge(u, v);
        }
        count += 1;
    }
    count
}

/// The weakest cut over all pairs drawn from `srcs` and the states at
/// `dst_loc`, reported with the witness pair's locations. `None` when
/// either side is empty.
pub fn disconnect_locs(
    cg: &Pcg,
    srcs: &[u32],
    dst_loc: &str,
) -> Option<(u32, Arc<str>, Arc<str>)> {
    let mut dsts: Vec<u32> = cg
        .vertices()
        .filter(|s| s.is_real() && &**s.loc() == dst_loc)
        .map(|s| s.id)
        .collect();
    dsts.sort_unstable();
    if srcs.is_empty() || dsts.is_empty() {
        return None;
    }

    let mut best: Option<(u32, u32, u32)> = None;
    for &src in srcs {
        for &dst in &dsts {
            let k = disconnect(cg, src, dst);
            if best.is_none_or(|(cur, _, _)| k < cur) {
                best = Some((k, src, dst));
            }
        }
    }
    best.map(|(k, src, dst)| {
        (
            k.saturating_sub(1),
            Arc::clone(cg.state(src).loc()),
            Arc::clone(cg.state(dst).loc()),
        )
    })
}
