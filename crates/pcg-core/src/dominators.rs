//! Iterative dominator-tree computation (Cooper/Harvey/Kennedy) over the
//! product graph, rooted at Start going down or End going up.

use crate::pcg::Pcg;
use crate::reach::{post_order, Direction};
use rustc_hash::FxHashMap;

pub struct DomTree {
    idom: FxHashMap<u32, u32>,
    root: u32,
}

impl DomTree {
    /// Dominators of every vertex reachable from `root` along `dir`.
    pub fn compute(cg: &Pcg, root: u32, dir: Direction) -> DomTree {
        let order = post_order(cg, root, dir);
        let mut po: FxHashMap<u32, u32> = FxHashMap::default();
        for (i, &v) in order.iter().enumerate() {
            po.insert(v, i as u32);
        }

        let mut idom: FxHashMap<u32, u32> = FxHashMap::default();
        idom.insert(root, root);

        let intersect = |idom: &FxHashMap<u32, u32>, mut a: u32, mut b: u32| -> u32 {
            while a != b {
                while po[&a] < po[&b] {
                    a = idom[&a];
                }
                while po[&b] < po[&a] {
                    b = idom[&b];
                }
            }
            a
        };

        let mut changed = true;
        while changed {
            changed = false;
            // Reverse postorder, root excluded.
            for &v in order.iter().rev() {
                if v == root {
                    continue;
                }
                // Predecessors with respect to the traversal direction.
                let preds = match dir {
                    Direction::Down => cg.in_neighbors(v),
                    Direction::Up => cg.out_neighbors(v),
                };
                let mut new_idom: Option<u32> = None;
                for &p in preds {
                    if !po.contains_key(&p) || !idom.contains_key(&p) {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => p,
                        Some(cur) => intersect(&idom, cur, p),
                    });
                }
                if let Some(d) = new_idom {
                    if idom.get(&v) != Some(&d) {
                        idom.insert(v, d);
                        changed = true;
                    }
                }
            }
        }

        DomTree { idom, root }
    }

    pub fn immediate_dominator(&self, v: u32) -> Option<u32> {
        if v == self.root {
            return None;
        }
        self.idom.get(&v).copied()
    }

    /// True iff `d` dominates `v` (reflexively).
    pub fn dominates(&self, d: u32, v: u32) -> bool {
        if d == v {
            return true;
        }
        self.find_dominator(v, |u| u == d).is_some()
    }

    /// Walk the strict dominator chain of `v` toward the root and return
    /// the first ancestor satisfying the predicate.
    pub fn find_dominator(&self, v: u32, mut pred: impl FnMut(u32) -> bool) -> Option<u32> {
        let mut cur = v;
        loop {
            let up = *self.idom.get(&cur)?;
            if pred(up) {
                return Some(up);
            }
            if up == self.root || up == cur {
                return None;
            }
            cur = up;
        }
    }

    /// True iff some strict dominator of `v` satisfies the predicate.
    pub fn is_dominated_by(&self, v: u32, pred: impl FnMut(u32) -> bool) -> bool {
        self.find_dominator(v, pred).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcg::{build_from_automata, END_ID, START_ID};
    use crate::testutil::{ends_with, line_abc};
    use std::sync::Arc;

    #[test]
    fn test_forward_dominators_on_line() {
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let cg = build_from_automata(topo, &[d1]).unwrap();
        let dom = DomTree::compute(&cg, START_ID, Direction::Down);

        // Start dominates everything reachable.
        for s in cg.vertices() {
            if s.id != START_ID {
                assert!(dom.dominates(START_ID, s.id), "start must dominate {}", s.id);
            }
        }
        assert_eq!(dom.immediate_dominator(START_ID), None);
    }

    #[test]
    fn test_backward_dominators_on_line() {
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let cg = build_from_automata(topo, &[d1]).unwrap();
        let dom = DomTree::compute(&cg, END_ID, Direction::Up);

        // The only accepting location is A, so every real vertex must
        // pass through the A state on its way to End.
        let a = cg
            .vertices()
            .find(|s| s.is_real() && &**s.loc() == "A")
            .unwrap()
            .id;
        for s in cg.vertices() {
            if s.is_real() && s.id != a {
                assert!(dom.dominates(a, s.id), "A must back-dominate {}", s.id);
            }
        }
    }

    #[test]
    fn test_find_dominator_predicate() {
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let cg = build_from_automata(topo, &[d1]).unwrap();
        let dom = DomTree::compute(&cg, END_ID, Direction::Up);

        let b = cg
            .vertices()
            .find(|s| s.is_real() && &**s.loc() == "B")
            .unwrap()
            .id;
        let found = dom.find_dominator(b, |u| &**cg.state(u).loc() == "A");
        assert!(found.is_some());
        let missing = dom.find_dominator(b, |u| &**cg.state(u).loc() == "C");
        assert!(missing.is_none());
    }
}
