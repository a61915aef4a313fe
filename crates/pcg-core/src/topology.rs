//! The topology input model: router locations, node roles, and the
//! physical adjacency the product construction walks.

use crate::graph::Digraph;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Role of a node in the topology.
///
/// `Start` and `End` are synthetic bookends added by the product
/// construction; `Unknown` stands for an unspecified external AS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Start,
    End,
    Inside,
    InsideOriginates,
    Outside,
    Unknown,
}

/// A router location together with its role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopoNode {
    loc: Arc<str>,
    kind: NodeKind,
}

impl TopoNode {
    pub fn new(loc: impl Into<Arc<str>>, kind: NodeKind) -> Self {
        TopoNode {
            loc: loc.into(),
            kind,
        }
    }

    pub fn loc(&self) -> &Arc<str> {
        &self.loc
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_inside(&self) -> bool {
        matches!(self.kind, NodeKind::Inside | NodeKind::InsideOriginates)
    }

    pub fn is_outside(&self) -> bool {
        matches!(self.kind, NodeKind::Outside | NodeKind::Unknown)
    }

    /// Whether traffic can start at this node. Any real router qualifies;
    /// only the synthetic bookends cannot source traffic.
    pub fn can_originate_traffic(&self) -> bool {
        !matches!(self.kind, NodeKind::Start | NodeKind::End)
    }

    /// True for real routers, false for the synthetic bookends.
    pub fn is_topo_node(&self) -> bool {
        !matches!(self.kind, NodeKind::Start | NodeKind::End)
    }
}

/// The network topology: a node table plus undirected adjacency, stored as
/// a digraph with both orientations of every link.
pub struct Topology {
    nodes: Vec<TopoNode>,
    graph: Digraph<u32>,
    by_loc: FxHashMap<Arc<str>, u32>,
}

impl Topology {
    /// Build from a node table and undirected links given by location.
    /// Unknown locations in `links` are ignored.
    pub fn new(nodes: Vec<TopoNode>, links: &[(&str, &str)]) -> Self {
        let mut by_loc: FxHashMap<Arc<str>, u32> = FxHashMap::default();
        let mut graph = Digraph::new();
        for (i, n) in nodes.iter().enumerate() {
            by_loc.insert(Arc::clone(&n.loc), i as u32);
            graph.add_vertex(i as u32);
        }
        for &(a, b) in links {
            let (Some(&u), Some(&v)) = (by_loc.get(a), by_loc.get(b)) else {
                continue;
            };
            graph.add_edge(u, v);
            graph.add_edge(v, u);
        }
        Topology {
            nodes,
            graph,
            by_loc,
        }
    }

    pub fn node(&self, idx: u32) -> &TopoNode {
        &self.nodes[idx as usize]
    }

    pub fn index_of(&self, loc: &str) -> Option<u32> {
        self.by_loc.get(loc).copied()
    }

    pub fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
        0..self.nodes.len() as u32
    }

    pub fn neighbors(&self, idx: u32) -> &[u32] {
        self.graph.out_neighbors(idx)
    }

    /// Undirected links, each reported once with the smaller index first.
    pub fn links(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.graph.edges().filter(|&(u, v)| u < v)
    }

    /// Weak connectivity over the whole vertex set.
    pub fn is_well_formed(&self) -> bool {
        let (_, count) = self.graph.weak_components();
        count <= 1
    }

    /// The location alphabet, split into internal and external locations.
    pub fn alphabet(&self) -> (FxHashSet<Arc<str>>, FxHashSet<Arc<str>>) {
        let mut inside = FxHashSet::default();
        let mut outside = FxHashSet::default();
        for n in &self.nodes {
            if n.is_inside() {
                inside.insert(Arc::clone(&n.loc));
            } else if n.is_outside() {
                outside.insert(Arc::clone(&n.loc));
            }
        }
        (inside, outside)
    }

    /// Indices of nodes that can originate traffic.
    pub fn originators(&self) -> impl Iterator<Item = u32> + '_ {
        self.vertices()
            .filter(move |&i| self.node(i).can_originate_traffic())
    }
}
