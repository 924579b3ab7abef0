//! Planner façade binding the roadmap, overlay, effort model, and lazy
//! search together.
//!
//! Problem lifecycle: `set_problem` binds the target validity context,
//! rebuilds the overlay (start and goal roots plus anchor edges into the
//! core roadmap), and applies it. `solve` then alternates lazy search with
//! roadmap densification until a fully evaluated path exists, the batch cap
//! is exhausted, or the termination condition trips.

use crate::common::error::{PlannerError, PlannerResult};
use crate::family::effort_model::FamilyEffortModel;
use crate::family::{Family, SubsetId};
use crate::lazysp::{lazy_shortest_path, LazySpGraph, LazySpOutcome, Selector};
use crate::overlay::{OverlayGraph, OverlayVertexId};
use crate::roadmap::graph::{EdgeId, Roadmap, VertexId};
use crate::roadmap::{edge_interior_states, RoadmapGen};
use crate::space::{State, StateSpace};
use crate::utils::BisectPerm;

/// Planner tuning knobs. All coefficients must be non-negative.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Weight of the edge distance term.
    pub coeff_distance: f64,
    /// Weight of the remaining check cost term.
    pub coeff_checkcost: f64,
    /// Weight of the batch penalty term.
    pub coeff_subgraph: f64,
    pub selector: Selector,
    /// Space distance within which start and goal anchor into the roadmap.
    pub anchor_radius: f64,
    /// Densification cap; defaults to the generator's own cap.
    pub max_batches: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            coeff_distance: 1.0,
            coeff_checkcost: 0.0,
            coeff_subgraph: 0.0,
            selector: Selector::Alt,
            anchor_radius: 0.12,
            max_batches: None,
        }
    }
}

impl PlannerConfig {
    fn validate(&self) -> PlannerResult<()> {
        if self.coeff_distance < 0.0 || self.coeff_checkcost < 0.0 || self.coeff_subgraph < 0.0 {
            return Err(PlannerError::BadArgs(
                "weight coefficients must be non-negative".to_string(),
            ));
        }
        if self.anchor_radius < 0.0 {
            return Err(PlannerError::BadArgs(
                "anchor radius must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// One query: start and goal configurations plus the validity context the
/// path must satisfy.
#[derive(Debug)]
pub struct Problem {
    pub start: State,
    pub goal: State,
    pub target: SubsetId,
}

/// Terminal planner outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerStatus {
    /// Collision-free path from start to goal, as a state sequence.
    ExactSolution(Vec<State>),
    /// Unreachable under every available batch, or cancelled.
    Timeout,
}

/// Multi-set lazy PRM planner.
pub struct MultiSetPrm<S: StateSpace> {
    space: S,
    effort: FamilyEffortModel,
    generator: Box<dyn RoadmapGen>,
    config: PlannerConfig,
    g: Roadmap,
    og: OverlayGraph,
    ov_start: Option<OverlayVertexId>,
    ov_goal: Option<OverlayVertexId>,
    check_radius: f64,
    bisect: BisectPerm,
    num_batches: usize,
}

impl<S: StateSpace> MultiSetPrm<S> {
    /// Builds the planner and generates `initial_batches` roadmap batches up
    /// front.
    pub fn new(
        space: S,
        family: Family,
        generator: Box<dyn RoadmapGen>,
        config: PlannerConfig,
        initial_batches: usize,
    ) -> PlannerResult<Self> {
        config.validate()?;
        let effort = FamilyEffortModel::new(family)?;
        let check_radius = 0.5 * space.longest_valid_segment_length();
        let mut planner = MultiSetPrm {
            space,
            effort,
            generator,
            config,
            g: Roadmap::new(),
            og: OverlayGraph::new(),
            ov_start: None,
            ov_goal: None,
            check_radius,
            bisect: BisectPerm::new(),
            num_batches: initial_batches,
        };
        planner
            .generator
            .generate(&planner.space, &mut planner.g, initial_batches)?;
        for index in 0..planner.g.num_edges() {
            planner.init_edge(EdgeId(index));
        }
        Ok(planner)
    }

    pub fn space(&self) -> &S {
        &self.space
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn roadmap(&self) -> &Roadmap {
        &self.g
    }

    pub fn num_batches_generated(&self) -> usize {
        self.generator.num_batches_generated()
    }

    /// Read access to the effort model backing the tag queries.
    pub fn effort_model(&self) -> &FamilyEffortModel {
        &self.effort
    }

    /// Membership predicate invocations so far.
    pub fn num_checks(&self) -> usize {
        self.effort.num_checks()
    }

    fn init_edge(&mut self, e: EdgeId) {
        let (u, v) = self.g.endpoints(e);
        let states = edge_interior_states(
            &self.space,
            &self.g.vertex(u).state,
            &self.g.vertex(v).state,
            self.g.edge(e).distance,
            self.check_radius,
            &mut self.bisect,
        );
        self.g.set_edge_interior(e, states);
    }

    fn recompute_w_lazy(&mut self, e: EdgeId) {
        calculate_w_lazy(&mut self.g, &self.effort, &self.config, e);
    }

    /// Binds a new query. Retargets the effort model if the validity context
    /// changed, rebuilds the overlay with fresh roots and anchors, and
    /// applies it.
    pub fn set_problem(&mut self, problem: Problem) -> PlannerResult<()> {
        if self.effort.target() != Some(problem.target) {
            self.effort.set_target(problem.target)?;
            for index in 0..self.g.num_edges() {
                self.recompute_w_lazy(EdgeId(index));
            }
        }

        self.og.unapply(&mut self.g);
        self.og.clear();

        let ov_start = self.og.add_root(problem.start.clone());
        let ov_goal = if self.space.distance(&problem.start, &problem.goal) == 0.0 {
            ov_start
        } else {
            self.og.add_root(problem.goal.clone())
        };
        self.ov_start = Some(ov_start);
        self.ov_goal = Some(ov_goal);

        let mut roots = vec![ov_start];
        if ov_goal != ov_start {
            roots.push(ov_goal);
        }
        for root in roots {
            let root_state = self.og.root_state(root).clone();
            for index in 0..self.g.num_vertices() {
                let v = VertexId(index);
                let dist = self.space.distance(&root_state, &self.g.vertex(v).state);
                if self.config.anchor_radius < dist {
                    continue;
                }
                let anchor = self.og.add_anchor(v);
                let states = edge_interior_states(
                    &self.space,
                    &root_state,
                    &self.g.vertex(v).state,
                    dist,
                    self.check_radius,
                    &mut self.bisect,
                );
                self.og.add_edge(root, anchor, dist, states);
            }
        }

        self.apply_overlay();
        Ok(())
    }

    fn apply_overlay(&mut self) {
        self.og.apply(&mut self.g);
        let applied: Vec<EdgeId> = self
            .og
            .applied_edges()
            .iter()
            .map(|&oe| self.og.core_edge(oe).expect("applied overlay edge"))
            .collect();
        for e in applied {
            self.recompute_w_lazy(e);
        }
    }

    /// Generator hard caps always bind; `max_batches` can only tighten them.
    fn effective_cap(&self) -> Option<usize> {
        match (self.config.max_batches, self.generator.batch_cap()) {
            (Some(configured), Some(hard)) => Some(configured.min(hard)),
            (Some(configured), None) => Some(configured),
            (None, hard) => hard,
        }
    }

    fn can_densify(&self) -> bool {
        match self.effective_cap() {
            Some(cap) => self.num_batches < cap,
            None => true,
        }
    }

    fn densify_once(&mut self) -> PlannerResult<()> {
        self.og.unapply(&mut self.g);
        self.num_batches += 1;
        let edges_before = self.g.num_edges();
        self.generator
            .generate(&self.space, &mut self.g, self.num_batches)?;
        for index in edges_before..self.g.num_edges() {
            self.init_edge(EdgeId(index));
            self.recompute_w_lazy(EdgeId(index));
        }
        self.apply_overlay();
        Ok(())
    }

    /// Requests one more roadmap batch. Returns false when the batch cap is
    /// already reached.
    pub fn densify(&mut self) -> PlannerResult<bool> {
        if self.effort.target().is_none() {
            return Err(PlannerError::NoTarget);
        }
        if !self.can_densify() {
            return Ok(false);
        }
        self.densify_once()?;
        Ok(true)
    }

    /// Runs lazy search, densifying between failed searches, until a path is
    /// found, the batch cap is exhausted, or `termination` trips.
    pub fn solve(&mut self, termination: &mut dyn FnMut() -> bool) -> PlannerResult<PlannerStatus> {
        let (ov_start, ov_goal) = match (self.ov_start, self.ov_goal) {
            (Some(s), Some(g)) => (s, g),
            _ => return Err(PlannerError::NoTarget),
        };
        loop {
            let start = self
                .og
                .core_vertex(ov_start)
                .ok_or_else(|| PlannerError::Internal("overlay not applied in solve".to_string()))?;
            let goal = self
                .og
                .core_vertex(ov_goal)
                .ok_or_else(|| PlannerError::Internal("overlay not applied in solve".to_string()))?;

            let selector = self.config.selector;
            let outcome = {
                let mut model = PlannerModel {
                    g: &mut self.g,
                    effort: &mut self.effort,
                    config: &self.config,
                };
                lazy_shortest_path(&mut model, start, goal, selector, termination)
            };

            match outcome {
                LazySpOutcome::Path(path) => {
                    let mut states = Vec::with_capacity(path.len() + 1);
                    states.push(self.g.vertex(start).state.clone());
                    for step in &path {
                        states.push(self.g.vertex(step.target).state.clone());
                    }
                    return Ok(PlannerStatus::ExactSolution(states));
                }
                LazySpOutcome::Interrupted => return Ok(PlannerStatus::Timeout),
                LazySpOutcome::Unreachable => {
                    if termination() || !self.can_densify() {
                        return Ok(PlannerStatus::Timeout);
                    }
                    self.densify_once()?;
                }
            }
        }
    }
}

/// Lazy weight of one edge: infinite once any of its locations is known
/// invalid, otherwise an affine combination of distance, batch penalty, and
/// remaining check cost (endpoints weighted half, shared between their
/// incident edges).
fn calculate_w_lazy(
    g: &mut Roadmap,
    effort: &FamilyEffortModel,
    config: &PlannerConfig,
    e: EdgeId,
) {
    let (u, v) = g.endpoints(e);
    let tag_u = g.vertex(u).tag;
    let tag_v = g.vertex(v).tag;
    let edge = g.edge(e);
    let known_invalid = effort.x_hat(tag_u).is_infinite()
        || effort.x_hat(tag_v).is_infinite()
        || edge.edge_tags.iter().any(|&t| effort.x_hat(t).is_infinite());
    let w = if known_invalid {
        f64::INFINITY
    } else {
        let checks: f64 = edge.edge_tags.iter().map(|&t| effort.p_hat(t)).sum::<f64>()
            + 0.5 * effort.p_hat(tag_u)
            + 0.5 * effort.p_hat(tag_v);
        config.coeff_distance * edge.distance
            + config.coeff_subgraph * edge.distance * edge.subgraph as f64
            + config.coeff_checkcost * checks
    };
    g.edge_mut(e).w_lazy = w;
}

/// Graph view handed to the lazy search; owns the evaluation side effects.
struct PlannerModel<'a> {
    g: &'a mut Roadmap,
    effort: &'a mut FamilyEffortModel,
    config: &'a PlannerConfig,
}

impl PlannerModel<'_> {
    /// Runs pending checks on an edge: endpoints first, then interior points
    /// in stored (bisection) order, stopping at the first failure.
    fn eval_pending(&mut self, e: EdgeId) -> bool {
        let (u, v) = self.g.endpoints(e);
        for vertex in [u, v] {
            while !self.effort.is_evaled(self.g.vertex(vertex).tag) {
                let mut tag = self.g.vertex(vertex).tag;
                let passed = self.effort.eval_partial(&mut tag, &self.g.vertex(vertex).state);
                self.g.vertex_mut(vertex).tag = tag;
                if !passed {
                    return false;
                }
            }
        }
        for i in 0..self.g.edge(e).edge_tags.len() {
            while !self.effort.is_evaled(self.g.edge(e).edge_tags[i]) {
                let mut tag = self.g.edge(e).edge_tags[i];
                let passed = self
                    .effort
                    .eval_partial(&mut tag, &self.g.edge(e).edge_states[i]);
                self.g.edge_mut(e).edge_tags[i] = tag;
                if !passed {
                    return false;
                }
            }
        }
        true
    }
}

impl LazySpGraph for PlannerModel<'_> {
    fn num_vertices(&self) -> usize {
        self.g.num_vertices()
    }

    fn out_edges(&self, v: VertexId) -> &[EdgeId] {
        self.g.out_edges(v)
    }

    fn opposite(&self, e: EdgeId, v: VertexId) -> VertexId {
        self.g.opposite(e, v)
    }

    fn w_lazy(&self, e: EdgeId) -> f64 {
        self.g.edge(e).w_lazy
    }

    fn is_evaled(&self, e: EdgeId) -> bool {
        let (u, v) = self.g.endpoints(e);
        self.effort.is_evaled(self.g.vertex(u).tag)
            && self.effort.is_evaled(self.g.vertex(v).tag)
            && self
                .g
                .edge(e)
                .edge_tags
                .iter()
                .all(|&t| self.effort.is_evaled(t))
    }

    fn evaluate(&mut self, e: EdgeId) -> f64 {
        self.eval_pending(e);
        // endpoint tag changes affect every incident edge
        calculate_w_lazy(self.g, self.effort, self.config, e);
        let (u, v) = self.g.endpoints(e);
        let mut incident: Vec<EdgeId> = self.g.out_edges(u).to_vec();
        incident.extend_from_slice(self.g.out_edges(v));
        for edge in incident {
            calculate_w_lazy(self.g, self.effort, self.config, edge);
        }
        self.g.edge(e).w_lazy
    }
}
