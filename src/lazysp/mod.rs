//! Lazy shortest-path search.
//!
//! Alternates an inner Dijkstra over the current lazy weights with targeted
//! evaluation of path edges, until a candidate path is fully evaluated or the
//! goal becomes unreachable. The graph is abstracted behind [`LazySpGraph`]
//! so the search owns no planner state; evaluating an edge may update lazy
//! weights anywhere in the graph.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use itertools::Itertools;
use ordered_float::NotNan;

use crate::common::error::{PlannerError, PlannerResult};
use crate::roadmap::graph::{EdgeId, VertexId};

/// Edge-evaluation selector policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// First unevaluated edge along the candidate path.
    Fwd,
    /// Unevaluated edge nearest the path midpoint, alternating sides.
    Alt,
}

impl Selector {
    pub fn from_name(name: &str) -> PlannerResult<Self> {
        match name {
            "fwd" => Ok(Selector::Fwd),
            "alt" => Ok(Selector::Alt),
            other => Err(PlannerError::BadArgs(format!(
                "unknown selector `{}`",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Selector::Fwd => "fwd",
            Selector::Alt => "alt",
        }
    }
}

/// One path step: an undirected edge oriented away from the source, together
/// with the vertex it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEdge {
    pub edge: EdgeId,
    pub target: VertexId,
}

/// Result of one lazy search.
#[derive(Debug)]
pub enum LazySpOutcome {
    /// Fully evaluated finite-weight path, possibly empty when start equals
    /// goal.
    Path(Vec<PathEdge>),
    /// No finite-weight path exists under the current lazy weights.
    Unreachable,
    /// The termination condition tripped.
    Interrupted,
}

/// Graph view consumed by the lazy search.
pub trait LazySpGraph {
    fn num_vertices(&self) -> usize;
    fn out_edges(&self, v: VertexId) -> &[EdgeId];
    fn opposite(&self, e: EdgeId, v: VertexId) -> VertexId;
    /// Current lazy weight, non-negative or infinite.
    fn w_lazy(&self, e: EdgeId) -> f64;
    /// True once every check on the edge and its endpoints is decided.
    fn is_evaled(&self, e: EdgeId) -> bool;
    /// Performs pending checks on the edge and returns its recomputed lazy
    /// weight. May update lazy weights of other edges.
    fn evaluate(&mut self, e: EdgeId) -> f64;
}

/// Lazy shortest path from `start` to `goal`.
///
/// The termination condition is polled at the top of every outer iteration;
/// in-flight evaluations are never interrupted.
pub fn lazy_shortest_path<G: LazySpGraph>(
    g: &mut G,
    start: VertexId,
    goal: VertexId,
    selector: Selector,
    termination: &mut dyn FnMut() -> bool,
) -> LazySpOutcome {
    let mut alt_state = AltState::default();
    loop {
        if termination() {
            return LazySpOutcome::Interrupted;
        }
        let path = match inner_dijkstra(g, start, goal) {
            Some(path) => path,
            None => return LazySpOutcome::Unreachable,
        };
        let unevaled: Vec<usize> = path
            .iter()
            .positions(|step| !g.is_evaled(step.edge))
            .collect();
        if unevaled.is_empty() {
            return LazySpOutcome::Path(path);
        }
        let chosen = match selector {
            Selector::Fwd => unevaled[0],
            Selector::Alt => alt_state.select(path.len(), &unevaled),
        };
        g.evaluate(path[chosen].edge);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Target,
}

/// Alternating-selector memory: which half of the path the previous
/// evaluation happened on.
#[derive(Debug, Default)]
struct AltState {
    last_side: Option<Side>,
}

impl AltState {
    /// Picks the unevaluated index nearest the path midpoint. A midpoint tie
    /// goes to the side away from the most recent evaluation; with no history
    /// the smaller index wins.
    fn select(&mut self, path_len: usize, unevaled: &[usize]) -> usize {
        let mid = (path_len as f64 - 1.0) / 2.0;
        let mut best: Vec<usize> = Vec::new();
        let mut best_dist = f64::INFINITY;
        for &i in unevaled {
            let dist = (i as f64 - mid).abs();
            if dist < best_dist {
                best_dist = dist;
                best.clear();
                best.push(i);
            } else if dist == best_dist {
                best.push(i);
            }
        }
        let chosen = if best.len() == 1 {
            best[0]
        } else {
            match self.last_side {
                Some(Side::Source) => best[best.len() - 1],
                Some(Side::Target) | None => best[0],
            }
        };
        self.last_side = Some(if (chosen as f64) < mid {
            Side::Source
        } else {
            Side::Target
        });
        chosen
    }
}

/// Dijkstra over the lazy weights, stopping as soon as the goal is settled.
/// Equal distances settle in vertex-index order. Returns the oriented edge
/// sequence, or `None` when the goal is unreachable.
fn inner_dijkstra<G: LazySpGraph>(
    g: &G,
    start: VertexId,
    goal: VertexId,
) -> Option<Vec<PathEdge>> {
    let n = g.num_vertices();
    let mut dist = vec![f64::INFINITY; n];
    let mut pred: Vec<Option<(EdgeId, VertexId)>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap: BinaryHeap<Reverse<(NotNan<f64>, usize)>> = BinaryHeap::new();

    dist[start.0] = 0.0;
    heap.push(Reverse((NotNan::new(0.0).ok()?, start.0)));
    while let Some(Reverse((d, u))) = heap.pop() {
        let u = VertexId(u);
        if settled[u.0] {
            continue;
        }
        settled[u.0] = true;
        if u == goal {
            break;
        }
        for &e in g.out_edges(u) {
            let w = g.w_lazy(e);
            if !w.is_finite() {
                continue;
            }
            let v = g.opposite(e, u);
            if settled[v.0] {
                continue;
            }
            let candidate = d.into_inner() + w;
            if candidate < dist[v.0] {
                dist[v.0] = candidate;
                pred[v.0] = Some((e, u));
                if let Ok(key) = NotNan::new(candidate) {
                    heap.push(Reverse((key, v.0)));
                }
            }
        }
    }

    if !dist[goal.0].is_finite() {
        return None;
    }
    let mut path = Vec::new();
    let mut walk = goal;
    while walk != start {
        let (e, prev) = pred[walk.0]?;
        path.push(PathEdge {
            edge: e,
            target: walk,
        });
        walk = prev;
    }
    path.reverse();
    Some(path)
}
