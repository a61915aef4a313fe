//! Graph minimization: sound reductions applied until the graph stops
//! shrinking.
//!
//! Every pass only removes vertices or edges, so `|V|+|E|` is a strict
//! monovariant and the fixpoint loop terminates.

use crate::dominators::DomTree;
use crate::pcg::{shadows, Pcg, END_ID, START_ID};
use crate::reach::{dfs, Direction};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Minimize a copy of `cg` to fixpoint and return it.
pub fn minimize(cg: &Pcg) -> Pcg {
    let mut cg = cg.copy_graph();
    loop {
        let size = cg.vertex_count() + cg.edge_count();

        remove_unreachable(&mut cg);
        remove_redundant_externals(&mut cg);
        remove_connections_to_out_star(&mut cg);
        remove_dominated(&mut cg);

        debug!(
            vertices = cg.vertex_count(),
            edges = cg.edge_count(),
            "minimization pass"
        );

        if cg.vertex_count() + cg.edge_count() == size {
            return cg;
        }
    }
}

/// Drop real vertices that cannot reach End or that Start cannot reach.
fn remove_unreachable(cg: &mut Pcg) {
    let can_finish = dfs(cg, END_ID, Direction::Up);
    let doomed: Vec<u32> = cg
        .vertices()
        .filter(|s| s.is_real() && !can_finish.contains(&s.id))
        .map(|s| s.id)
        .collect();
    for v in doomed {
        cg.remove_state(v);
    }

    let from_start = dfs(cg, START_ID, Direction::Down);
    let doomed: Vec<u32> = cg
        .vertices()
        .filter(|s| s.is_real() && !from_start.contains(&s.id))
        .map(|s| s.id)
        .collect();
    for v in doomed {
        cg.remove_state(v);
    }
}

fn is_subset(xs: &[u32], ys: &[u32]) -> bool {
    let set: FxHashSet<u32> = ys.iter().copied().collect();
    xs.iter().all(|x| set.contains(x))
}

/// An external vertex hanging off a repeated-out state with no behavior
/// of its own is indistinguishable from looping through the self-edge.
fn remove_redundant_externals(cg: &mut Pcg) {
    let mut doomed: FxHashSet<u32> = FxHashSet::default();
    for os in cg.vertex_ids_sorted() {
        if !cg.is_repeated_out(os) {
            continue;
        }
        let neighbors: FxHashSet<u32> = cg
            .out_neighbors(os)
            .iter()
            .chain(cg.in_neighbors(os))
            .copied()
            .collect();
        for &n in &neighbors {
            if n == os || !cg.state(n).node.is_outside() {
                continue;
            }
            if cg.graph.out_degree(n) == 1 && is_subset(cg.in_neighbors(n), cg.in_neighbors(os)) {
                doomed.insert(n);
            } else if cg.graph.in_degree(n) == 1
                && is_subset(cg.out_neighbors(n), cg.out_neighbors(os))
            {
                doomed.insert(n);
            }
        }
    }
    for v in doomed {
        cg.remove_state(v);
    }
}

/// Edge filtering around repeated-out states. The two arms are not
/// symmetric around Start; see the regression tests below before
/// changing either.
fn remove_connections_to_out_star(cg: &mut Pcg) {
    let doomed: Vec<(u32, u32)> = cg
        .edges()
        .filter(|&(x, y)| {
            if !cg.state(x).is_real() || !cg.state(y).is_real() {
                return false;
            }
            if cg.is_repeated_out(x) {
                cg.in_neighbors(y)
                    .iter()
                    .any(|&w| cg.state(w).node.is_inside())
            } else if cg.is_repeated_out(y) {
                cg.out_neighbors(x)
                    .iter()
                    .any(|&w| cg.state(w).node.is_inside())
                    && (cg.in_neighbors(y).contains(&START_ID)
                        || !cg.in_neighbors(x).contains(&START_ID))
            } else {
                false
            }
        })
        .collect();
    for (u, v) in doomed {
        cg.remove_edge(u, v);
    }
}

/// Dominator-based removals over the concrete topology vertices.
fn remove_dominated(cg: &mut Pcg) {
    let dom = DomTree::compute(cg, START_ID, Direction::Down);
    let dom_rev = DomTree::compute(cg, END_ID, Direction::Up);

    // A vertex that must pass a same-location vertex on every path from
    // Start, or on every path to End, is redundant.
    let doomed: Vec<u32> = cg
        .vertices()
        .filter(|s| {
            s.is_real()
                && !cg.is_repeated_out(s.id)
                && (dom.is_dominated_by(s.id, |u| shadows(cg.state(u), s))
                    || dom_rev.is_dominated_by(s.id, |u| shadows(cg.state(u), s)))
        })
        .map(|s| s.id)
        .collect();
    if !doomed.is_empty() {
        for v in doomed {
            cg.remove_state(v);
        }
        // Dominator trees are stale after vertex removal; the outer
        // fixpoint loop revisits the edge rules.
        return;
    }

    // Of a two-cycle, drop the edge that walks back into a dominator:
    // u -> v is useless when v already lies on every path into u, or u
    // on every path out of v.
    let doomed: Vec<(u32, u32)> = cg
        .edges()
        .filter(|&(u, v)| {
            cg.contains_edge(v, u)
                && !cg.is_repeated_out(u)
                && !cg.is_repeated_out(v)
                && (dom.is_dominated_by(u, |d| d == v) || dom_rev.is_dominated_by(v, |d| d == u))
        })
        .collect();
    for (u, v) in doomed {
        cg.remove_edge(u, v);
    }

    // An edge into a vertex that must later pass a shadow of its source
    // would repeat the source location along the path.
    let doomed: Vec<(u32, u32)> = cg
        .edges()
        .filter(|&(u, v)| dom_rev.is_dominated_by(v, |w| shadows(cg.state(w), cg.state(u))))
        .collect();
    for (u, v) in doomed {
        cg.remove_edge(u, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcg::build_from_automata;
    use crate::testutil::{ends_with, line_abc, outside_pair};
    use std::sync::Arc;

    fn line_two_prefs() -> Pcg {
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let d2 = ends_with("C", &["A", "B", "C"]);
        build_from_automata(topo, &[d1, d2]).unwrap()
    }

    #[test]
    fn test_minimize_monotone_and_idempotent() {
        let cg = line_two_prefs();
        let before = cg.vertex_count() + cg.edge_count();
        let m1 = minimize(&cg);
        assert!(m1.vertex_count() + m1.edge_count() <= before);
        assert!(m1.vertex_count() <= cg.vertex_count());

        let m2 = minimize(&m1);
        assert_eq!(m2.vertex_count(), m1.vertex_count());
        assert_eq!(m2.edge_count(), m1.edge_count());
        let mut e1: Vec<(u32, u32)> = m1.edges().collect();
        let mut e2: Vec<(u32, u32)> = m2.edges().collect();
        e1.sort_unstable();
        e2.sort_unstable();
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_minimize_preserves_preferences() {
        let cg = line_two_prefs();
        let m = minimize(&cg);
        assert_eq!(m.preferences(), cg.preferences());
        assert_eq!(m.accepting_states().len(), 2);
    }

    #[test]
    fn test_minimize_breaks_cycles_on_single_preference() {
        // With ".*A" alone, every loop must come back through the A
        // state, so the dominator rules cut the graph down to the three
        // chains into A.
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let cg = build_from_automata(topo, &[d1]).unwrap();
        let m = minimize(&cg);

        let find = |loc: &str| {
            m.vertices()
                .find(|s| s.is_real() && &**s.loc() == loc)
                .map(|s| s.id)
                .unwrap()
        };
        let (a, b, c) = (find("A"), find("B"), find("C"));
        assert!(m.contains_edge(b, a));
        assert!(m.contains_edge(c, b));
        assert!(!m.contains_edge(a, b));
        assert!(!m.contains_edge(b, c));
        assert!(m.contains_edge(START_ID, a));
        assert!(m.contains_edge(START_ID, b));
        assert!(m.contains_edge(START_ID, c));
        assert!(m.contains_edge(a, END_ID));
        assert_eq!(m.vertex_count(), 5);
        assert_eq!(m.edge_count(), 6);
    }

    #[test]
    fn test_out_star_source_arm_drops_self_loop_with_inside_entry() {
        // A(inside) -- X(unknown): the self-loop at X has an inside
        // in-neighbor through A, so the repeated-out source arm fires on
        // X -> X before anything else can use it.
        let cg = outside_pair();
        let x = cg
            .vertices()
            .find(|s| s.is_real() && &**s.loc() == "X")
            .map(|s| s.id)
            .unwrap();
        assert!(cg.contains_edge(x, x));

        let mut probe = cg.copy_graph();
        remove_connections_to_out_star(&mut probe);
        assert!(!probe.contains_edge(x, x));
    }

    #[test]
    fn test_out_star_target_arm_requires_start_condition() {
        // The target arm needs an inside out-neighbor of the source AND
        // the Start condition on the endpoints; on this graph Start feeds
        // both A and X directly, so A -> X satisfies the arm only
        // because Start is an in-neighbor of X.
        let cg = outside_pair();
        let a = cg
            .vertices()
            .find(|s| s.is_real() && &**s.loc() == "A")
            .map(|s| s.id)
            .unwrap();
        let x = cg
            .vertices()
            .find(|s| s.is_real() && &**s.loc() == "X")
            .map(|s| s.id)
            .unwrap();

        let mut probe = cg.copy_graph();
        remove_connections_to_out_star(&mut probe);
        // A's only inside out-neighbor would have to exist for the arm
        // to fire; A's successors are X and End only, so A -> X stays.
        assert!(probe.contains_edge(a, x));
    }

    #[test]
    fn test_unreachable_pruning() {
        let mut cg = line_two_prefs();
        // Sever everything into End; all real vertices become useless.
        cg.remove_edges_if(|_, v| v == END_ID);
        let m = minimize(&cg);
        assert!(m.is_empty());
        assert_eq!(m.vertex_count(), 2);
    }
}
