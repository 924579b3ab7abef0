//! Concrete roadmap graph with arena-allocated vertex and edge records.
//!
//! Vertices and edges are stored in insertion order and addressed by stable
//! indices; all per-entity properties live directly on the records. The only
//! removal supported is popping the most recently inserted entities, which is
//! exactly what the overlay layer needs to retract its insertions.

use crate::family::effort_model::Tag;
use crate::space::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub usize);

/// One roadmap milestone.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub state: State,
    /// Densification batch this vertex first appeared in.
    pub subgraph: usize,
    /// Reserved for roadmap pruning; not consulted by the base planner.
    pub is_shadow: bool,
    pub tag: Tag,
}

/// One candidate local path between two milestones.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Stable insertion id.
    pub index: usize,
    u: VertexId,
    v: VertexId,
    /// Cached space distance between the endpoint states.
    pub distance: f64,
    pub subgraph: usize,
    /// Interior configurations, stored in bisection order.
    pub edge_states: Vec<State>,
    /// One tag per interior configuration.
    pub edge_tags: Vec<Tag>,
    /// Current lazy weight; infinite until computed.
    pub w_lazy: f64,
}

impl Edge {
    pub fn endpoints(&self) -> (VertexId, VertexId) {
        (self.u, self.v)
    }
}

/// Undirected roadmap graph.
#[derive(Debug, Default)]
pub struct Roadmap {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<EdgeId>>,
}

impl Roadmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(vertex);
        self.adjacency.push(Vec::new());
        id
    }

    pub fn add_edge(&mut self, u: VertexId, v: VertexId, distance: f64, subgraph: usize) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            index: id.0,
            u,
            v,
            distance,
            subgraph,
            edge_states: Vec::new(),
            edge_tags: Vec::new(),
            w_lazy: f64::INFINITY,
        });
        self.adjacency[u.0].push(id);
        self.adjacency[v.0].push(id);
        id
    }

    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v.0]
    }

    pub fn vertex_mut(&mut self, v: VertexId) -> &mut Vertex {
        &mut self.vertices[v.0]
    }

    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e.0]
    }

    pub fn edge_mut(&mut self, e: EdgeId) -> &mut Edge {
        &mut self.edges[e.0]
    }

    pub fn endpoints(&self, e: EdgeId) -> (VertexId, VertexId) {
        self.edges[e.0].endpoints()
    }

    /// The endpoint of `e` that is not `v`.
    pub fn opposite(&self, e: EdgeId, v: VertexId) -> VertexId {
        let (u, w) = self.edges[e.0].endpoints();
        if u == v {
            w
        } else {
            u
        }
    }

    pub fn out_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.adjacency[v.0]
    }

    /// Installs interior states on an edge and resets their tags.
    pub fn set_edge_interior(&mut self, e: EdgeId, states: Vec<State>) {
        let edge = &mut self.edges[e.0];
        edge.edge_tags = vec![crate::family::TAG_UNKNOWN; states.len()];
        edge.edge_states = states;
    }

    /// Removes the most recently inserted edge. The edge must still be the
    /// tail entry of both endpoint adjacency lists.
    pub fn remove_last_edge(&mut self) {
        let edge = self
            .edges
            .pop()
            .expect("remove_last_edge on a graph without edges");
        let removed = EdgeId(self.edges.len());
        for end in [edge.u, edge.v] {
            let popped = self.adjacency[end.0].pop();
            assert_eq!(
                popped,
                Some(removed),
                "edge removal must be last-in-first-out"
            );
        }
    }

    /// Removes the most recently inserted vertex, which must be isolated.
    pub fn remove_last_vertex(&mut self) {
        assert!(
            self.adjacency
                .last()
                .map(|adj| adj.is_empty())
                .unwrap_or(false),
            "vertex removal requires an isolated tail vertex"
        );
        self.adjacency.pop();
        self.vertices.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::TAG_UNKNOWN;

    fn vertex(x: f64, y: f64) -> Vertex {
        Vertex {
            state: State::new(vec![x, y]),
            subgraph: 0,
            is_shadow: false,
            tag: TAG_UNKNOWN,
        }
    }

    #[test]
    fn test_add_and_query() {
        let mut g = Roadmap::new();
        let a = g.add_vertex(vertex(0.0, 0.0));
        let b = g.add_vertex(vertex(1.0, 0.0));
        let c = g.add_vertex(vertex(0.0, 1.0));
        let e0 = g.add_edge(a, b, 1.0, 0);
        let e1 = g.add_edge(a, c, 1.0, 0);
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.out_edges(a), &[e0, e1]);
        assert_eq!(g.opposite(e0, a), b);
        assert_eq!(g.opposite(e0, b), a);
        assert_eq!(g.edge(e1).index, 1);
    }

    #[test]
    fn test_interior_bookkeeping() {
        let mut g = Roadmap::new();
        let a = g.add_vertex(vertex(0.0, 0.0));
        let b = g.add_vertex(vertex(1.0, 0.0));
        let e = g.add_edge(a, b, 1.0, 0);
        g.set_edge_interior(e, vec![State::new(vec![0.5, 0.0])]);
        assert_eq!(g.edge(e).edge_states.len(), g.edge(e).edge_tags.len());
    }

    #[test]
    fn test_lifo_removal() {
        let mut g = Roadmap::new();
        let a = g.add_vertex(vertex(0.0, 0.0));
        let b = g.add_vertex(vertex(1.0, 0.0));
        let c = g.add_vertex(vertex(2.0, 0.0));
        g.add_edge(a, b, 1.0, 0);
        g.add_edge(b, c, 1.0, 0);
        g.add_edge(a, c, 2.0, 0);
        g.remove_last_edge();
        g.remove_last_edge();
        g.remove_last_vertex();
        assert_eq!(g.num_vertices(), 2);
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.out_edges(a).len(), 1);
    }

    #[test]
    #[should_panic]
    fn test_remove_vertex_with_edges_panics() {
        let mut g = Roadmap::new();
        let a = g.add_vertex(vertex(0.0, 0.0));
        let b = g.add_vertex(vertex(1.0, 0.0));
        g.add_edge(a, b, 1.0, 0);
        g.remove_last_vertex();
    }
}
