//! The product construction graph: topology × per-preference DFAs.
//!
//! Each vertex pairs a router location with a composite DFA state and the
//! set of preference levels satisfied there. The builder walks the product
//! with a worklist, pruning successors whose every automaton has fallen
//! into a garbage state.

use crate::bitset::Preferences;
use crate::dfa::{Dfa, FlatDfa};
use crate::error::BuildError;
use crate::graph::Digraph;
use crate::reindex::Reindexer;
use crate::topology::{NodeKind, TopoNode, Topology};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

pub const START_ID: u32 = 0;
pub const END_ID: u32 = 1;

/// A vertex of the product construction graph.
///
/// Identity, equality, and ordering are by `id` alone; `id`s are unique
/// within a single graph instance.
#[derive(Debug, Clone)]
pub struct CgState {
    pub id: u32,
    /// Composite DFA state, reindexed to a dense integer.
    pub state: u32,
    /// Preference levels accepted at this vertex.
    pub accept: Preferences,
    /// The router location this vertex stands at.
    pub node: TopoNode,
}

impl CgState {
    pub fn loc(&self) -> &Arc<str> {
        self.node.loc()
    }

    /// True for real routers, false for the Start/End bookends.
    pub fn is_real(&self) -> bool {
        self.node.is_topo_node()
    }
}

impl PartialEq for CgState {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CgState {}

impl std::hash::Hash for CgState {
    fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
        self.id.hash(h);
    }
}

impl PartialOrd for CgState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CgState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::fmt::Display for CgState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.state, self.loc())
    }
}

/// Two distinct states standing at the same location.
pub fn shadows(x: &CgState, y: &CgState) -> bool {
    x.id != y.id && x.loc() == y.loc()
}

/// The product construction graph.
#[derive(Clone)]
pub struct Pcg {
    pub(crate) graph: Digraph<u32>,
    pub(crate) states: FxHashMap<u32, CgState>,
    pub(crate) topo: Arc<Topology>,
}

impl Pcg {
    pub fn start(&self) -> &CgState {
        &self.states[&START_ID]
    }

    pub fn end(&self) -> &CgState {
        &self.states[&END_ID]
    }

    pub fn state(&self, id: u32) -> &CgState {
        &self.states[&id]
    }

    pub fn topo(&self) -> &Arc<Topology> {
        &self.topo
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_edge(&self, u: u32, v: u32) -> bool {
        self.graph.contains_edge(u, v)
    }

    pub fn out_neighbors(&self, v: u32) -> &[u32] {
        self.graph.out_neighbors(v)
    }

    pub fn in_neighbors(&self, v: u32) -> &[u32] {
        self.graph.in_neighbors(v)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &CgState> + '_ {
        self.graph.vertices().map(move |id| self.state(id))
    }

    /// Vertex ids in ascending order, for deterministic walks.
    pub fn vertex_ids_sorted(&self) -> Vec<u32> {
        self.graph.vertices_sorted()
    }

    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.graph.edges()
    }

    /// An `Unknown`-typed vertex with a self-loop; stands for any
    /// external AS repeated arbitrarily often.
    pub fn is_repeated_out(&self, v: u32) -> bool {
        self.state(v).node.kind() == NodeKind::Unknown && self.graph.contains_edge(v, v)
    }

    /// Union of the accept sets over the whole graph.
    pub fn preferences(&self) -> Preferences {
        self.vertices()
            .fold(Preferences::empty(), |acc, s| acc.union(s.accept))
    }

    pub fn accepting_states(&self) -> Vec<&CgState> {
        let mut out: Vec<&CgState> = self.vertices().filter(|s| !s.accept.is_empty()).collect();
        out.sort();
        out
    }

    pub fn accepting_locations(&self) -> FxHashSet<Arc<str>> {
        self.accepting_states()
            .iter()
            .map(|s| Arc::clone(s.loc()))
            .collect()
    }

    /// True when no accepting path remains from Start to End.
    pub fn is_empty(&self) -> bool {
        let mut visited: FxHashSet<u32> = FxHashSet::default();
        let mut stack = vec![START_ID];
        visited.insert(START_ID);
        while let Some(v) = stack.pop() {
            if v == END_ID {
                return false;
            }
            for &w in self.graph.out_neighbors(v) {
                if visited.insert(w) {
                    stack.push(w);
                }
            }
        }
        true
    }

    /// An owner-exclusive structural copy with identical ids and edges.
    pub fn copy_graph(&self) -> Pcg {
        self.clone()
    }

    /// A copy with every edge reversed; vertex set and ids unchanged.
    pub fn copy_reverse_graph(&self) -> Pcg {
        Pcg {
            graph: self.graph.reverse(),
            states: self.states.clone(),
            topo: Arc::clone(&self.topo),
        }
    }

    /// Keep only states whose minimum accepted preference is at most `i`
    /// (states accepting nothing are kept). Produces a copy.
    pub fn restrict(&self, i: u32) -> Pcg {
        let mut out = self.copy_graph();
        out.remove_states_if(|s| s.accept.min().is_some_and(|m| m > i));
        out
    }

    pub(crate) fn remove_states_if(&mut self, mut pred: impl FnMut(&CgState) -> bool) -> usize {
        let states = &self.states;
        let removed = self.graph.remove_vertex_if(|id| pred(&states[&id]));
        let graph = &self.graph;
        self.states.retain(|id, _| graph.contains_vertex(*id));
        removed
    }

    pub(crate) fn remove_edges_if(&mut self, mut pred: impl FnMut(u32, u32) -> bool) -> usize {
        self.graph.remove_edge_if(|u, v| pred(u, v))
    }

    pub(crate) fn remove_edge(&mut self, u: u32, v: u32) -> bool {
        self.graph.remove_edge(u, v)
    }

    pub(crate) fn remove_state(&mut self, id: u32) -> bool {
        self.states.remove(&id);
        self.graph.remove_vertex(id)
    }
}

/// Build the product of `topo` with up to 31 DFAs, one per preference
/// level (level `i+1` for `autos[i]`; lower is stronger).
pub fn build_from_automata(topo: Arc<Topology>, autos: &[Dfa]) -> Result<Pcg, BuildError> {
    if autos.len() > Preferences::MAX_LEVEL as usize {
        return Err(BuildError::TooManyPreferences(autos.len()));
    }
    if !topo.is_well_formed() {
        return Err(BuildError::MalformedTopology);
    }

    let flats: Vec<FlatDfa> = autos.iter().map(FlatDfa::expand).collect();

    let mut graph: Digraph<u32> = Digraph::new();
    let mut states: FxHashMap<u32, CgState> = FxHashMap::default();
    let mut reindex: Reindexer<Vec<u32>> = Reindexer::new();
    // (composite, topology node) -> vertex id
    let mut seen: FxHashMap<(Vec<u32>, u32), u32> = FxHashMap::default();
    // vertex id -> topology node index (real vertices only)
    let mut node_of: FxHashMap<u32, u32> = FxHashMap::default();

    let start_comp: Vec<u32> = flats.iter().map(|f| f.q0).collect();
    let start = CgState {
        id: START_ID,
        state: reindex.index(&start_comp),
        accept: Preferences::empty(),
        node: TopoNode::new("start", NodeKind::Start),
    };
    graph.add_vertex(START_ID);
    states.insert(START_ID, start);

    let mut comp_of: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
    comp_of.insert(START_ID, start_comp);

    let mut next_id: u32 = 2;
    let mut worklist: VecDeque<u32> = VecDeque::new();
    worklist.push_back(START_ID);

    while let Some(cur) = worklist.pop_front() {
        let cur_comp = comp_of[&cur].clone();

        // Successor locations: traffic can start at any real router, so
        // Start fans out to all of them; afterwards we follow topology
        // adjacency, plus a self-step for unknown external nodes.
        let succ_nodes: Vec<u32> = if cur == START_ID {
            topo.originators().collect()
        } else {
            let n = node_of[&cur];
            let mut adj = topo.neighbors(n).to_vec();
            if topo.node(n).kind() == NodeKind::Unknown {
                adj.push(n);
            }
            adj
        };

        for c in succ_nodes {
            let loc = Arc::clone(topo.node(c).loc());

            let mut comp = Vec::with_capacity(flats.len());
            let mut dead = true;
            for (i, flat) in flats.iter().enumerate() {
                match flat.step(cur_comp[i], &loc) {
                    Some(q) => {
                        if !flat.is_garbage(q) {
                            dead = false;
                        }
                        comp.push(q);
                    }
                    // No transition: this automaton is out of the race.
                    None => comp.push(u32::MAX),
                }
            }
            if dead {
                continue;
            }

            let mut accept = Preferences::empty();
            if topo.node(c).can_originate_traffic() {
                for (i, flat) in flats.iter().enumerate() {
                    if comp[i] != u32::MAX && flat.is_final(comp[i]) {
                        accept = accept.union(Preferences::singleton(i as u32 + 1));
                    }
                }
            }

            let key = (comp.clone(), c);
            let id = match seen.get(&key) {
                Some(&id) => id,
                None => {
                    let id = next_id;
                    next_id += 1;
                    let st = CgState {
                        id,
                        state: reindex.index(&comp),
                        accept,
                        node: topo.node(c).clone(),
                    };
                    graph.add_vertex(id);
                    states.insert(id, st);
                    seen.insert(key, id);
                    node_of.insert(id, c);
                    comp_of.insert(id, comp);
                    worklist.push_back(id);
                    id
                }
            };
            graph.add_edge(cur, id);
        }
    }

    // End is a synthetic sink fed by every accepting vertex.
    let end = CgState {
        id: END_ID,
        state: reindex.len() as u32,
        accept: Preferences::empty(),
        node: TopoNode::new("end", NodeKind::End),
    };
    graph.add_vertex(END_ID);
    states.insert(END_ID, end);
    let accepting: Vec<u32> = states
        .values()
        .filter(|s| !s.accept.is_empty())
        .map(|s| s.id)
        .collect();
    for v in accepting {
        graph.add_edge(v, END_ID);
    }

    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        automata = autos.len(),
        "product construction done"
    );

    Ok(Pcg {
        graph,
        states,
        topo,
    })
}
