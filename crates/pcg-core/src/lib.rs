//! Product construction graph core for the policy compiler.
//!
//! Takes a network topology and one DFA per preference level, builds the
//! product graph of all policy-satisfying paths, minimizes it with
//! dominator-based reductions, and infers per-location preference
//! orderings via a simulation check. Failure analysis and regex
//! extraction operate on the minimized graph.

pub mod bitset;
pub mod consistency;
pub mod dfa;
pub mod dominators;
pub mod error;
pub mod failures;
pub mod graph;
pub mod minimize;
pub mod pcg;
pub mod reach;
pub mod regex;
pub mod reindex;
pub mod topology;
pub mod viz;

pub use bitset::Preferences;
pub use consistency::{find_ordering_conservative, Ordering};
pub use dfa::Dfa;
pub use error::{BuildError, OrderingError};
pub use failures::{all_failures, disconnect, disconnect_locs, failed_graph, Failure};
pub use minimize::minimize;
pub use pcg::{build_from_automata, CgState, Pcg, END_ID, START_ID};
pub use regex::{construct_regex, Re};
pub use topology::{NodeKind, TopoNode, Topology};


#[cfg(test)]
mod pipeline_tests {
    use crate::consistency::find_ordering_conservative;
    use crate::failures::{disconnect_locs, failed_graph, Failure};
    use crate::minimize::minimize;
    use crate::pcg::build_from_automata;
    use crate::testutil::{ends_with, line_abc};
    use std::sync::Arc;

    /// The full line-topology pipeline: build, minimize, order, fail.
    #[test]
    fn test_line_pipeline() {
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let d2 = ends_with("C", &["A", "B", "C"]);
        let cg = build_from_automata(Arc::clone(&topo), &[d1, d2]).unwrap();

        let prefs = cg.preferences();
        assert!(prefs.contains(1) && prefs.contains(2));

        let m = minimize(&cg);
        assert!(m.vertex_count() <= cg.vertex_count());

        let ord = find_ordering_conservative(&m).unwrap();
        assert_eq!(ord[&Arc::from("A")].len(), 1);
        assert_eq!(ord[&Arc::from("C")].len(), 1);

        // With B failed, no A-to-C corridor survives.
        let srcs: Vec<u32> = m
            .vertices()
            .filter(|s| s.is_real() && &**s.loc() == "A")
            .map(|s| s.id)
            .collect();
        let failed = failed_graph(&m, &[Failure::Node(Arc::from("B"))]);
        if let Some((k, _, _)) = disconnect_locs(&failed, &srcs, "C") {
            // 0 disconnect rounds, minus one saturating, is 0.
            assert_eq!(k, 0);
        }
    }
}
