//! Roadmap graph, batchwise generators, and persistence.

pub mod generators;
pub mod graph;
pub mod io;

pub use generators::{roadmap_gen_from_id, HaltonDensGen, RggGen, RoadmapGen};
pub use graph::{Edge, EdgeId, Roadmap, Vertex, VertexId};
pub use io::{read_roadmap, write_roadmap};

use crate::space::{State, StateSpace};
use crate::utils::BisectPerm;

/// Interior configurations of an edge, in bisection order.
///
/// An edge of length `L` gets `⌊L / (2r)⌋` interior points, where `r` is the
/// planner's check radius; point `i` of the permutation sits at parameter
/// `(1 + order[i]) / (n + 1)`. Short edges get none.
pub fn edge_interior_states(
    space: &dyn StateSpace,
    a: &State,
    b: &State,
    distance: f64,
    check_radius: f64,
    perm: &mut BisectPerm,
) -> Vec<State> {
    let n = (distance / (2.0 * check_radius)).floor() as usize;
    let order = perm.get(n);
    let mut states = Vec::with_capacity(n);
    for &k in order {
        let mut s = space.alloc_state();
        space.interpolate(a, b, (1 + k) as f64 / (n + 1) as f64, &mut s);
        states.push(s);
    }
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::RealVectorSpace;

    #[test]
    fn test_interior_count_scales_with_length() {
        let space = RealVectorSpace::unit(2, 0.1).unwrap();
        let mut perm = BisectPerm::new();
        let a = State::new(vec![0.0, 0.0]);
        let b = State::new(vec![0.55, 0.0]);
        // r = 0.05 here, so 0.55 / 0.1 -> 5 interior points
        let states = edge_interior_states(&space, &a, &b, 0.55, 0.05, &mut perm);
        assert_eq!(states.len(), 5);
        // first checked point is the midpoint of the edge
        assert!((states[0].values()[0] - 0.55 * 3.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_edge_has_no_interior() {
        let space = RealVectorSpace::unit(2, 0.1).unwrap();
        let mut perm = BisectPerm::new();
        let a = State::new(vec![0.0, 0.0]);
        let b = State::new(vec![0.09, 0.0]);
        let states = edge_interior_states(&space, &a, &b, 0.09, 0.05, &mut perm);
        assert!(states.is_empty());
    }
}
