//! Preference-ordering inference.
//!
//! For every internal location the engine decides, via a simulation-style
//! `protect` check, which of its states is at least as preferred as which,
//! then topologically sorts the resulting relation into a per-location
//! preference list.

use crate::dominators::DomTree;
use crate::error::OrderingError;
use crate::graph::Digraph;
use crate::pcg::{CgState, Pcg, START_ID};
use crate::reach::{dfs, Direction};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Per-location preference lists, most preferred first.
pub type Ordering = FxHashMap<Arc<str>, Vec<CgState>>;

/// Decide whether `x`'s forward behavior dominates `y`'s.
///
/// Builds the candidate relation by BFS from `(x, y)`. Each pair must
/// satisfy the accept-minimum condition, and every move of the weaker
/// side must be answered by a same-location move of the stronger side,
/// falling back to a forward dominator of the stronger state. Returns
/// every discovered pair on success, the offending pair on failure.
fn protect(
    cg: &Pcg,
    dom: &DomTree,
    x: u32,
    y: u32,
    cache: &FxHashSet<(u32, u32)>,
) -> Result<Vec<(u32, u32)>, (u32, u32)> {
    let mut seen: FxHashSet<(u32, u32)> = FxHashSet::default();
    let mut queue: VecDeque<(u32, u32)> = VecDeque::new();
    seen.insert((x, y));
    queue.push_back((x, y));

    while let Some((a, b)) = queue.pop_front() {
        if a == b || cache.contains(&(a, b)) {
            continue;
        }

        match (cg.state(a).accept.min(), cg.state(b).accept.min()) {
            (None, None) => {}
            (Some(am), Some(bm)) if am <= bm => {}
            _ => return Err((a, b)),
        }

        let mut b_succs: Vec<u32> = cg.out_neighbors(b).to_vec();
        b_succs.sort_unstable();
        for b2 in b_succs {
            let loc = Arc::clone(cg.state(b2).loc());
            let mut a_succs: Vec<u32> = cg.out_neighbors(a).to_vec();
            a_succs.sort_unstable();
            let answer = a_succs
                .into_iter()
                .find(|&a2| cg.state(a2).loc() == &loc)
                .or_else(|| dom.find_dominator(a, |d| cg.state(d).loc() == &loc));
            match answer {
                Some(a2) => {
                    if seen.insert((a2, b2)) {
                        queue.push_back((a2, b2));
                    }
                }
                None => return Err((a, b)),
            }
        }
    }

    Ok(seen.into_iter().collect())
}

/// Hard preferences forced by the topology: when one state can reach a
/// shadow of itself going down, the nearer one must win or a single
/// physical path would carry conflicting ranks.
fn must_prefer(cg: &Pcg) -> Vec<(u32, u32)> {
    let mut inside = Digraph::new();
    for s in cg.vertices() {
        if s.is_real() && s.node.is_inside() {
            inside.add_vertex(s.id);
        }
    }
    for (u, v) in cg.edges() {
        if inside.contains_vertex(u) && inside.contains_vertex(v) {
            inside.add_edge(u, v);
        }
    }
    let (component, _) = inside.weak_components();

    let mut by_loc: FxHashMap<Arc<str>, Vec<u32>> = FxHashMap::default();
    for s in cg.vertices() {
        if s.is_real() && s.node.is_inside() {
            by_loc.entry(Arc::clone(s.loc())).or_default().push(s.id);
        }
    }

    let mut required = Vec::new();
    for ids in by_loc.values_mut() {
        if ids.len() < 2 {
            continue;
        }
        ids.sort_unstable();
        for &d in ids.iter() {
            let below = dfs(cg, d, Direction::Down);
            for &d2 in ids.iter() {
                if d != d2 && component[&d] == component[&d2] && below.contains(&d2) {
                    required.push((d, d2));
                }
            }
        }
    }
    required
}

/// Derive a total preference order per internal location, or report the
/// witness pair that defeats it.
pub fn find_ordering_conservative(cg: &Pcg) -> Result<Ordering, OrderingError> {
    let dom = DomTree::compute(cg, START_ID, Direction::Down);
    let required = must_prefer(cg);
    // Positive protect results, shared across the whole call.
    let mut cache: FxHashSet<(u32, u32)> = FxHashSet::default();

    let mut by_loc: FxHashMap<Arc<str>, Vec<u32>> = FxHashMap::default();
    for s in cg.vertices() {
        if s.is_real() && s.node.is_inside() {
            by_loc.entry(Arc::clone(s.loc())).or_default().push(s.id);
        }
    }

    let mut locs: Vec<Arc<str>> = by_loc.keys().cloned().collect();
    locs.sort();

    let mut ordering: Ordering = FxHashMap::default();
    for loc in locs {
        let mut ids = by_loc.remove(&loc).unwrap();
        ids.sort_unstable();
        if ids.len() == 1 {
            ordering.insert(loc, vec![cg.state(ids[0]).clone()]);
            continue;
        }

        let mut rel: Digraph<u32> = Digraph::new();
        for &id in &ids {
            rel.add_vertex(id);
        }
        for &a in &ids {
            for &b in &ids {
                if a == b {
                    continue;
                }
                if let Ok(related) = protect(cg, &dom, a, b, &cache) {
                    cache.extend(related);
                    rel.add_edge(a, b);
                }
            }
        }

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                if !rel.contains_edge(a, b) && !rel.contains_edge(b, a) {
                    return Err(OrderingError::Inconsistent(
                        cg.state(a).clone(),
                        cg.state(b).clone(),
                    ));
                }
            }
        }

        for &(d, d2) in &required {
            if cg.state(d).loc() == &loc && !rel.contains_edge(d, d2) {
                return Err(OrderingError::SimplePath(
                    cg.state(d).clone(),
                    cg.state(d2).clone(),
                ));
            }
        }

        // Symmetric pairs are equivalences; drop both directions so the
        // sort is free to order them arbitrarily.
        let symmetric: Vec<(u32, u32)> = rel
            .edges()
            .filter(|&(a, b)| a < b && rel.contains_edge(b, a))
            .collect();
        for (a, b) in symmetric {
            rel.remove_edge(a, b);
            rel.remove_edge(b, a);
        }

        let sorted = topo_sort(&rel).map_err(|(a, b)| {
            OrderingError::Inconsistent(cg.state(a).clone(), cg.state(b).clone())
        })?;
        debug!(loc = %loc, states = sorted.len(), "location ordered");
        ordering.insert(loc, sorted.iter().map(|&id| cg.state(id).clone()).collect());
    }

    Ok(ordering)
}

/// Kahn's algorithm with ascending-id tie-breaking; an unresolvable
/// cycle is reported through its two smallest members.
fn topo_sort(rel: &Digraph<u32>) -> Result<Vec<u32>, (u32, u32)> {
    let mut indegree: FxHashMap<u32, usize> = rel
        .vertices()
        .map(|v| (v, rel.in_degree(v)))
        .collect();
    let mut ready: Vec<u32> = indegree
        .iter()
        .filter(|&(_, &d)| d == 0)
        .map(|(&v, _)| v)
        .collect();
    ready.sort_unstable_by(|a, b| b.cmp(a));

    let mut out = Vec::with_capacity(indegree.len());
    while let Some(v) = ready.pop() {
        out.push(v);
        for &w in rel.out_neighbors(v) {
            let d = indegree.get_mut(&w).unwrap();
            *d -= 1;
            if *d == 0 {
                ready.push(w);
                ready.sort_unstable_by(|a, b| b.cmp(a));
            }
        }
    }

    if out.len() != indegree.len() {
        let mut stuck: Vec<u32> = rel
            .vertices()
            .filter(|v| !out.contains(v))
            .collect();
        stuck.sort_unstable();
        return Err((stuck[0], stuck[1]));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minimize::minimize;
    use crate::pcg::build_from_automata;
    use crate::testutil::{ends_with, line_abc, raw_pcg, starts_with};
    use crate::topology::{NodeKind, TopoNode, Topology};
    use std::sync::Arc;

    #[test]
    fn test_singleton_orderings_on_line() {
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let d2 = ends_with("C", &["A", "B", "C"]);
        let cg = build_from_automata(topo, &[d1, d2]).unwrap();
        let m = minimize(&cg);
        let ord = find_ordering_conservative(&m).unwrap();
        assert_eq!(ord[&Arc::from("A")].len(), 1);
        assert_eq!(ord[&Arc::from("C")].len(), 1);
    }

    #[test]
    fn test_incomparable_duplicates_are_reported() {
        // ".*A" against "A.*": the two states at each shared location
        // disagree about which accepts, so neither simulates the other.
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let d2 = starts_with("A", &["A", "B", "C"]);
        let cg = build_from_automata(topo, &[d1, d2]).unwrap();
        let m = minimize(&cg);
        let err = find_ordering_conservative(&m).unwrap_err();
        match err {
            OrderingError::Inconsistent(x, y) => {
                assert_eq!(x.loc(), y.loc());
                assert_ne!(x.id, y.id);
            }
            other => panic!("expected Inconsistent, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_ordering_from_accept_minima() {
        // Hand-built: two B states whose downstream A states accept at
        // ranks 1 and 2; the rank-1 side must come out first everywhere.
        let topo = Arc::new(Topology::new(
            vec![
                TopoNode::new("A", NodeKind::InsideOriginates),
                TopoNode::new("B", NodeKind::Inside),
            ],
            &[("A", "B")],
        ));
        let cg = raw_pcg(
            Arc::clone(&topo),
            &[
                (2, "B", 0, &[]),
                (3, "B", 1, &[]),
                (4, "A", 2, &[1]),
                (5, "A", 3, &[2]),
            ],
            &[(0, 2), (0, 3), (2, 4), (3, 5), (4, 1), (5, 1)],
        );
        let ord = find_ordering_conservative(&cg).unwrap();
        let b: Vec<u32> = ord[&Arc::from("B")].iter().map(|s| s.id).collect();
        let a: Vec<u32> = ord[&Arc::from("A")].iter().map(|s| s.id).collect();
        assert_eq!(b, vec![2, 3]);
        assert_eq!(a, vec![4, 5]);
    }

    #[test]
    fn test_simple_path_violation() {
        // x at B reaches a shadow y of B downward, but x's own accepting
        // branch is ranked worse than y's, so the required preference of
        // x over y fails while y over x still holds.
        let topo = Arc::new(Topology::new(
            vec![
                TopoNode::new("A", NodeKind::InsideOriginates),
                TopoNode::new("B", NodeKind::Inside),
                TopoNode::new("M", NodeKind::Inside),
            ],
            &[("A", "B"), ("B", "M"), ("M", "B")],
        ));
        // 2 = x at B, 3 = m at M, 4 = y at B, 5 = P1 at A rank 2,
        // 6 = P2 at A rank 1.
        let cg = raw_pcg(
            Arc::clone(&topo),
            &[
                (2, "B", 0, &[]),
                (3, "M", 1, &[]),
                (4, "B", 2, &[]),
                (5, "A", 3, &[2]),
                (6, "A", 4, &[1]),
            ],
            &[(0, 2), (2, 3), (3, 4), (2, 5), (4, 6), (5, 1), (6, 1)],
        );
        let err = find_ordering_conservative(&cg).unwrap_err();
        match err {
            OrderingError::SimplePath(x, y) => {
                assert_eq!(x.id, 2);
                assert_eq!(y.id, 4);
            }
            other => panic!("expected SimplePath, got {:?}", other),
        }
    }

    #[test]
    fn test_equivalent_states_sort_without_error() {
        // Two B states with identical downstream behavior protect each
        // other; the symmetric edges cancel and both survive the sort.
        let topo = Arc::new(Topology::new(
            vec![
                TopoNode::new("A", NodeKind::InsideOriginates),
                TopoNode::new("B", NodeKind::Inside),
            ],
            &[("A", "B")],
        ));
        let cg = raw_pcg(
            Arc::clone(&topo),
            &[
                (2, "B", 0, &[]),
                (3, "B", 1, &[]),
                (4, "A", 2, &[1]),
            ],
            &[(0, 2), (0, 3), (2, 4), (3, 4), (4, 1)],
        );
        let ord = find_ordering_conservative(&cg).unwrap();
        assert_eq!(ord[&Arc::from("B")].len(), 2);
    }

    #[test]
    fn test_ordering_is_idempotent() {
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let d2 = ends_with("C", &["A", "B", "C"]);
        let m = minimize(&build_from_automata(topo, &[d1, d2]).unwrap());
        let first = find_ordering_conservative(&m).unwrap();
        let second = find_ordering_conservative(&m).unwrap();
        assert_eq!(first.len(), second.len());
        for (loc, states) in &first {
            let again: Vec<u32> = second[loc].iter().map(|s| s.id).collect();
            let ours: Vec<u32> = states.iter().map(|s| s.id).collect();
            assert_eq!(ours, again);
        }
    }
}
