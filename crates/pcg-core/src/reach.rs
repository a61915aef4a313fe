//! Reachability over the product graph, in either edge direction.

use crate::bitset::Preferences;
use crate::pcg::Pcg;
use rustc_hash::FxHashSet;

/// Which way to follow edges: `Down` walks outgoing edges toward End,
/// `Up` walks incoming edges toward Start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

#[inline]
fn neighbors(cg: &Pcg, v: u32, dir: Direction) -> &[u32] {
    match dir {
        Direction::Down => cg.out_neighbors(v),
        Direction::Up => cg.in_neighbors(v),
    }
}

/// Every vertex reachable from `src`, including `src` itself.
pub fn dfs(cg: &Pcg, src: u32, dir: Direction) -> FxHashSet<u32> {
    let mut visited: FxHashSet<u32> = FxHashSet::default();
    let mut stack = vec![src];
    visited.insert(src);
    while let Some(v) = stack.pop() {
        for &w in neighbors(cg, v, dir) {
            if visited.insert(w) {
                stack.push(w);
            }
        }
    }
    visited
}

/// Reachable vertices ordered with every vertex after all of its
/// children (two-phase explicit stack).
pub fn post_order(cg: &Pcg, src: u32, dir: Direction) -> Vec<u32> {
    let mut order = Vec::new();
    let mut visited: FxHashSet<u32> = FxHashSet::default();
    // (vertex, expanded)
    let mut stack: Vec<(u32, bool)> = vec![(src, false)];
    visited.insert(src);
    while let Some((v, expanded)) = stack.pop() {
        if expanded {
            order.push(v);
            continue;
        }
        stack.push((v, true));
        for &w in neighbors(cg, v, dir) {
            if visited.insert(w) {
                stack.push((w, false));
            }
        }
    }
    order
}

/// Union of the accept sets over everything reachable from `src`.
pub fn src_accepting(cg: &Pcg, src: u32, dir: Direction) -> Preferences {
    dfs(cg, src, dir)
        .into_iter()
        .fold(Preferences::empty(), |acc, v| {
            acc.union(cg.state(v).accept)
        })
}
