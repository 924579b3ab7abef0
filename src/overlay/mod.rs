//! Overlay staging layer for ephemeral roadmap entities.
//!
//! Start and goal roots, plus the anchor edges that tie them into the core
//! roadmap, live in an overlay graph. `apply` grafts the overlay onto the
//! core graph and records the inserted ids; `unapply` copies the (possibly
//! mutated) core properties back into the overlay, then retracts the inserted
//! entities in reverse insertion order. Property edits made while applied
//! therefore survive apply/unapply cycles, but no other code may insert or
//! remove core entities while the overlay is applied.

use crate::family::effort_model::{Tag, TAG_UNKNOWN};
use crate::roadmap::graph::{EdgeId, Roadmap, Vertex, VertexId};
use crate::space::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayVertexId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayEdgeId(pub usize);

/// An overlay vertex is either a root carrying its own configuration, or an
/// anchor standing in for a pre-existing core vertex.
#[derive(Debug)]
pub enum OverlayVertex {
    Root {
        state: State,
        subgraph: usize,
        is_shadow: bool,
        tag: Tag,
        core_vertex: Option<VertexId>,
    },
    Anchor {
        core_vertex: VertexId,
    },
}

/// Overlay edge with the full set of core edge properties.
#[derive(Debug)]
pub struct OverlayEdge {
    pub u: OverlayVertexId,
    pub v: OverlayVertexId,
    pub distance: f64,
    pub subgraph: usize,
    pub edge_states: Vec<State>,
    pub edge_tags: Vec<Tag>,
    pub w_lazy: f64,
    core_edge: Option<EdgeId>,
}

#[derive(Debug, Default)]
pub struct OverlayGraph {
    vertices: Vec<OverlayVertex>,
    edges: Vec<OverlayEdge>,
    is_applied: bool,
    applied_vertices: Vec<OverlayVertexId>,
    applied_edges: Vec<OverlayEdgeId>,
}

impl OverlayGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_applied(&self) -> bool {
        self.is_applied
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Adds a root vertex owning `state`. Roots always join batch 0 with a
    /// blank tag.
    pub fn add_root(&mut self, state: State) -> OverlayVertexId {
        let id = OverlayVertexId(self.vertices.len());
        self.vertices.push(OverlayVertex::Root {
            state,
            subgraph: 0,
            is_shadow: false,
            tag: TAG_UNKNOWN,
            core_vertex: None,
        });
        id
    }

    /// Adds an anchor referring to the core vertex `core`.
    pub fn add_anchor(&mut self, core: VertexId) -> OverlayVertexId {
        let id = OverlayVertexId(self.vertices.len());
        self.vertices.push(OverlayVertex::Anchor { core_vertex: core });
        id
    }

    /// Adds an overlay edge with its interior schedule already computed.
    pub fn add_edge(
        &mut self,
        u: OverlayVertexId,
        v: OverlayVertexId,
        distance: f64,
        edge_states: Vec<State>,
    ) -> OverlayEdgeId {
        let id = OverlayEdgeId(self.edges.len());
        let edge_tags = vec![TAG_UNKNOWN; edge_states.len()];
        self.edges.push(OverlayEdge {
            u,
            v,
            distance,
            subgraph: 0,
            edge_states,
            edge_tags,
            w_lazy: f64::INFINITY,
            core_edge: None,
        });
        id
    }

    pub fn edge(&self, e: OverlayEdgeId) -> &OverlayEdge {
        &self.edges[e.0]
    }

    pub fn edge_mut(&mut self, e: OverlayEdgeId) -> &mut OverlayEdge {
        &mut self.edges[e.0]
    }

    /// Core vertex currently backing an overlay vertex.
    pub fn core_vertex(&self, v: OverlayVertexId) -> Option<VertexId> {
        match &self.vertices[v.0] {
            OverlayVertex::Root { core_vertex, .. } => *core_vertex,
            OverlayVertex::Anchor { core_vertex } => Some(*core_vertex),
        }
    }

    /// Core edge inserted for an overlay edge, while applied.
    pub fn core_edge(&self, e: OverlayEdgeId) -> Option<EdgeId> {
        self.edges[e.0].core_edge
    }

    pub fn root_state(&self, v: OverlayVertexId) -> &State {
        match &self.vertices[v.0] {
            OverlayVertex::Root { state, .. } => state,
            OverlayVertex::Anchor { .. } => panic!("anchors carry no state"),
        }
    }

    pub fn applied_edges(&self) -> &[OverlayEdgeId] {
        &self.applied_edges
    }

    /// Discards all overlay entities. Only legal while unapplied.
    pub fn clear(&mut self) {
        assert!(!self.is_applied, "overlay cleared while applied");
        self.vertices.clear();
        self.edges.clear();
    }

    /// Grafts the overlay onto `g`: inserts one core vertex per root, one
    /// core edge per overlay edge, and pushes property values overlay to
    /// core. A second call without an intervening `unapply` is a no-op.
    pub fn apply(&mut self, g: &mut Roadmap) {
        if self.is_applied {
            return;
        }
        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            if let OverlayVertex::Root {
                state,
                subgraph,
                is_shadow,
                tag,
                core_vertex,
            } = vertex
            {
                let id = g.add_vertex(Vertex {
                    state: state.clone(),
                    subgraph: *subgraph,
                    is_shadow: *is_shadow,
                    tag: *tag,
                });
                *core_vertex = Some(id);
                self.applied_vertices.push(OverlayVertexId(i));
            }
        }
        for i in 0..self.edges.len() {
            let core_u = self
                .core_vertex(self.edges[i].u)
                .expect("overlay edge endpoint resolved after root insertion");
            let core_v = self
                .core_vertex(self.edges[i].v)
                .expect("overlay edge endpoint resolved after root insertion");
            let id = g.add_edge(core_u, core_v, self.edges[i].distance, self.edges[i].subgraph);
            let core = g.edge_mut(id);
            core.edge_states = self.edges[i].edge_states.clone();
            core.edge_tags = self.edges[i].edge_tags.clone();
            core.w_lazy = self.edges[i].w_lazy;
            self.edges[i].core_edge = Some(id);
            self.applied_edges.push(OverlayEdgeId(i));
        }
        self.is_applied = true;
    }

    /// Pulls current core property values back into the overlay, then removes
    /// the inserted core entities in reverse insertion order. A call while
    /// unapplied is a no-op.
    pub fn unapply(&mut self, g: &mut Roadmap) {
        if !self.is_applied {
            return;
        }
        for idx in 0..self.applied_vertices.len() {
            let ov = self.applied_vertices[idx];
            if let OverlayVertex::Root {
                state,
                subgraph,
                is_shadow,
                tag,
                core_vertex,
            } = &mut self.vertices[ov.0]
            {
                let core = core_vertex.expect("applied root has a core vertex");
                let record = g.vertex(core);
                *state = record.state.clone();
                *subgraph = record.subgraph;
                *is_shadow = record.is_shadow;
                *tag = record.tag;
            }
        }
        for idx in 0..self.applied_edges.len() {
            let oe = self.applied_edges[idx];
            let core = self.edges[oe.0].core_edge.expect("applied edge has a core edge");
            let record = g.edge(core);
            let edge = &mut self.edges[oe.0];
            edge.distance = record.distance;
            edge.subgraph = record.subgraph;
            edge.edge_states = record.edge_states.clone();
            edge.edge_tags = record.edge_tags.clone();
            edge.w_lazy = record.w_lazy;
        }
        for idx in (0..self.applied_edges.len()).rev() {
            let oe = self.applied_edges[idx];
            let core = self.edges[oe.0].core_edge.take().expect("applied edge");
            assert_eq!(core.0, g.num_edges() - 1, "core edge removal out of order");
            g.remove_last_edge();
        }
        for idx in (0..self.applied_vertices.len()).rev() {
            let ov = self.applied_vertices[idx];
            if let OverlayVertex::Root { core_vertex, .. } = &mut self.vertices[ov.0] {
                let core = core_vertex.take().expect("applied root");
                assert_eq!(core.0, g.num_vertices() - 1, "core vertex removal out of order");
                g.remove_last_vertex();
            }
        }
        self.applied_edges.clear();
        self.applied_vertices.clear();
        self.is_applied = false;
    }
}
