//! A small owned digraph with predicate removal and the handful of
//! traversals the product construction needs.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::hash::Hash;

/// Directed graph over copyable vertex keys. Edges are simple (at most one
/// edge per ordered pair); both adjacency directions are maintained.
#[derive(Clone)]
pub struct Digraph<V> {
    out: FxHashMap<V, Vec<V>>,
    inn: FxHashMap<V, Vec<V>>,
    num_edges: usize,
}

impl<V: Copy + Eq + Hash + Ord> Digraph<V> {
    pub fn new() -> Self {
        Digraph {
            out: FxHashMap::default(),
            inn: FxHashMap::default(),
            num_edges: 0,
        }
    }

    pub fn add_vertex(&mut self, v: V) {
        self.out.entry(v).or_default();
        self.inn.entry(v).or_default();
    }

    /// Add the edge `u -> v`, inserting both endpoints if needed.
    /// Returns false if the edge was already present.
    pub fn add_edge(&mut self, u: V, v: V) -> bool {
        self.add_vertex(u);
        self.add_vertex(v);
        let succs = self.out.get_mut(&u).unwrap();
        if succs.contains(&v) {
            return false;
        }
        succs.push(v);
        self.inn.get_mut(&v).unwrap().push(u);
        self.num_edges += 1;
        true
    }

    pub fn contains_vertex(&self, v: V) -> bool {
        self.out.contains_key(&v)
    }

    pub fn contains_edge(&self, u: V, v: V) -> bool {
        self.out.get(&u).is_some_and(|succs| succs.contains(&v))
    }

    pub fn out_neighbors(&self, v: V) -> &[V] {
        self.out.get(&v).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_neighbors(&self, v: V) -> &[V] {
        self.inn.get(&v).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, v: V) -> usize {
        self.out_neighbors(v).len()
    }

    pub fn in_degree(&self, v: V) -> usize {
        self.in_neighbors(v).len()
    }

    pub fn vertex_count(&self) -> usize {
        self.out.len()
    }

    pub fn edge_count(&self) -> usize {
        self.num_edges
    }

    pub fn vertices(&self) -> impl Iterator<Item = V> + '_ {
        self.out.keys().copied()
    }

    /// Vertices in ascending key order, for the places where iteration
    /// order leaks into output.
    pub fn vertices_sorted(&self) -> Vec<V> {
        let mut vs: Vec<V> = self.out.keys().copied().collect();
        vs.sort_unstable();
        vs
    }

    pub fn edges(&self) -> impl Iterator<Item = (V, V)> + '_ {
        self.out
            .iter()
            .flat_map(|(&u, succs)| succs.iter().map(move |&v| (u, v)))
    }

    pub fn remove_edge(&mut self, u: V, v: V) -> bool {
        let Some(succs) = self.out.get_mut(&u) else {
            return false;
        };
        let Some(pos) = succs.iter().position(|&w| w == v) else {
            return false;
        };
        succs.swap_remove(pos);
        let preds = self.inn.get_mut(&v).unwrap();
        let pos = preds.iter().position(|&w| w == u).unwrap();
        preds.swap_remove(pos);
        self.num_edges -= 1;
        true
    }

    pub fn remove_vertex(&mut self, v: V) -> bool {
        if !self.out.contains_key(&v) {
            return false;
        }
        for u in self.inn.remove(&v).unwrap() {
            let succs = self.out.get_mut(&u).unwrap();
            if let Some(pos) = succs.iter().position(|&w| w == v) {
                succs.swap_remove(pos);
                self.num_edges -= 1;
            }
        }
        for w in self.out.remove(&v).unwrap() {
            // Self-loops were already unlinked via the predecessor side.
            if w == v {
                continue;
            }
            let preds = self.inn.get_mut(&w).unwrap();
            if let Some(pos) = preds.iter().position(|&u| u == v) {
                preds.swap_remove(pos);
                self.num_edges -= 1;
            }
        }
        true
    }

    /// Remove every vertex satisfying the predicate. Returns the count removed.
    pub fn remove_vertex_if(&mut self, mut pred: impl FnMut(V) -> bool) -> usize {
        let doomed: Vec<V> = self.vertices().filter(|&v| pred(v)).collect();
        for &v in &doomed {
            self.remove_vertex(v);
        }
        doomed.len()
    }

    /// Remove every edge satisfying the predicate. Returns the count removed.
    pub fn remove_edge_if(&mut self, mut pred: impl FnMut(V, V) -> bool) -> usize {
        let doomed: Vec<(V, V)> = self.edges().filter(|&(u, v)| pred(u, v)).collect();
        for &(u, v) in &doomed {
            self.remove_edge(u, v);
        }
        doomed.len()
    }

    /// The edge-reversed graph over the same vertex set.
    pub fn reverse(&self) -> Self {
        Digraph {
            out: self.inn.clone(),
            inn: self.out.clone(),
            num_edges: self.num_edges,
        }
    }

    /// Label each vertex with its weakly-connected component, ids dense
    /// from 0. Returns the labeling and the component count.
    pub fn weak_components(&self) -> (FxHashMap<V, u32>, u32) {
        let mut label: FxHashMap<V, u32> = FxHashMap::default();
        let mut next = 0u32;
        let mut queue: VecDeque<V> = VecDeque::new();
        for v in self.vertices_sorted() {
            if label.contains_key(&v) {
                continue;
            }
            label.insert(v, next);
            queue.push_back(v);
            while let Some(u) = queue.pop_front() {
                for &w in self.out_neighbors(u).iter().chain(self.in_neighbors(u)) {
                    if !label.contains_key(&w) {
                        label.insert(w, next);
                        queue.push_back(w);
                    }
                }
            }
            next += 1;
        }
        (label, next)
    }

    /// One shortest path from `src` to `dst` under unit edge weights,
    /// returned as its edge list. `None` when `dst` is unreachable.
    pub fn shortest_path(&self, src: V, dst: V) -> Option<Vec<(V, V)>> {
        if !self.contains_vertex(src) || !self.contains_vertex(dst) {
            return None;
        }
        if src == dst {
            return Some(Vec::new());
        }
        let mut parent: FxHashMap<V, V> = FxHashMap::default();
        let mut visited: FxHashSet<V> = FxHashSet::default();
        let mut queue: VecDeque<V> = VecDeque::new();
        visited.insert(src);
        queue.push_back(src);
        while let Some(u) = queue.pop_front() {
            for &w in self.out_neighbors(u) {
                if visited.insert(w) {
                    parent.insert(w, u);
                    if w == dst {
                        let mut path = Vec::new();
                        let mut cur = dst;
                        while cur != src {
                            let p = parent[&cur];
                            path.push((p, cur));
                            cur = p;
                        }
                        path.reverse();
                        return Some(path);
                    }
                    queue.push_back(w);
                }
            }
        }
        None
    }
}

impl<V: Copy + Eq + Hash + Ord> Default for Digraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Digraph<u32> {
        let mut g = Digraph::new();
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        g.add_edge(1, 3);
        g.add_edge(2, 3);
        g
    }

    #[test]
    fn test_add_and_degrees() {
        let g = diamond();
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.out_degree(0), 2);
        assert_eq!(g.in_degree(3), 2);
        assert!(g.contains_edge(0, 1));
        assert!(!g.contains_edge(1, 0));
    }

    #[test]
    fn test_no_parallel_edges() {
        let mut g = diamond();
        assert!(!g.add_edge(0, 1));
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn test_remove_vertex_unlinks_edges() {
        let mut g = diamond();
        assert!(g.remove_vertex(1));
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert!(!g.contains_edge(0, 1));
        assert!(!g.contains_edge(1, 3));
    }

    #[test]
    fn test_remove_vertex_with_self_loop() {
        let mut g = Digraph::new();
        g.add_edge(0, 0);
        g.add_edge(0, 1);
        assert!(g.remove_vertex(0));
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.vertex_count(), 1);
    }

    #[test]
    fn test_predicate_removal() {
        let mut g = diamond();
        assert_eq!(g.remove_edge_if(|u, _| u == 0), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.remove_vertex_if(|v| v == 3), 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_reverse() {
        let g = diamond();
        let r = g.reverse();
        assert_eq!(r.vertex_count(), 4);
        assert_eq!(r.edge_count(), 4);
        for (u, v) in g.edges() {
            assert!(r.contains_edge(v, u));
        }
    }

    #[test]
    fn test_weak_components() {
        let mut g = diamond();
        g.add_edge(10, 11);
        let (label, count) = g.weak_components();
        assert_eq!(count, 2);
        assert_eq!(label[&0], label[&3]);
        assert_eq!(label[&10], label[&11]);
        assert_ne!(label[&0], label[&10]);
    }

    #[test]
    fn test_shortest_path() {
        let mut g = Digraph::new();
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(2, 3);
        g.add_edge(0, 3);
        let path = g.shortest_path(0, 3).unwrap();
        assert_eq!(path, vec![(0, 3)]);
        g.remove_edge(0, 3);
        let path = g.shortest_path(0, 3).unwrap();
        assert_eq!(path.len(), 3);
        g.remove_edge(1, 2);
        assert!(g.shortest_path(0, 3).is_none());
    }
}
