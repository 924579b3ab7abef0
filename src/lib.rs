//! Multi-set lazy shortest-path motion planning over probabilistic roadmaps.
//!
//! The planner searches a batchwise-densified roadmap with lazily estimated
//! edge weights, deferring expensive validity checks until a candidate path
//! demands them. Validity is organized as a family of related contexts, so
//! checks performed under one context can be reused by another.

pub mod common;
pub mod family;
pub mod lazysp;
pub mod overlay;
pub mod planner;
pub mod roadmap;
pub mod space;
pub mod utils;

pub use common::error::{PlannerError, PlannerResult};
pub use family::{Family, FamilyEffortModel, Relation, Subset, SubsetId};
pub use lazysp::Selector;
pub use planner::{MultiSetPrm, PlannerConfig, PlannerStatus, Problem};
pub use roadmap::{roadmap_gen_from_id, read_roadmap, write_roadmap, Roadmap, RoadmapGen};
pub use space::{RealVectorSpace, State, StateSpace};
