//! Property-based invariants for the roadmap machinery, the family effort
//! model, and the lazy edge weights.

use proptest::prelude::*;

use multiset_prm::family::TAG_UNKNOWN;
use multiset_prm::overlay::OverlayGraph;
use multiset_prm::roadmap::generators::{HaltonDensGen, RggGen};
use multiset_prm::roadmap::graph::{EdgeId, VertexId};
use multiset_prm::roadmap::edge_interior_states;
use multiset_prm::utils::{get_prime, halton, BisectPerm};
use multiset_prm::{
    roadmap_gen_from_id, Family, FamilyEffortModel, MultiSetPrm, PlannerConfig, Problem,
    RealVectorSpace, Relation, Roadmap, RoadmapGen, State, StateSpace, Subset,
};

/// Family of up to four subsets with scripted predicate outcomes; `relation`
/// optionally ties them together with an inclusion or an intersection.
fn scripted_family(subsets: &[(f64, f64, bool)], relation: u8) -> Family {
    let mut family = Family::new();
    for (i, &(cost, prior, passes)) in subsets.iter().enumerate() {
        family.add_subset(Subset::new(
            format!("s{}", i),
            cost,
            prior,
            Box::new(move |_| passes),
        ));
    }
    if subsets.len() >= 2 && relation % 3 == 1 {
        family.add_relation(Relation::Inclusion { sub: 0, sup: 1 });
    }
    if subsets.len() >= 3 && relation % 3 == 2 {
        family.add_relation(Relation::Intersection {
            whole: 0,
            parts: (1..subsets.len()).collect(),
        });
    }
    family
}

proptest! {
    #[test]
    fn bisect_order_is_a_midpoint_first_permutation(n in 0usize..256) {
        let mut perm = BisectPerm::new();
        let order = perm.get(n).to_vec();
        prop_assert_eq!(order.len(), n);
        let mut seen = vec![false; n];
        for i in &order {
            prop_assert!(!seen[*i]);
            seen[*i] = true;
        }
        if n > 0 {
            prop_assert_eq!(order[0], n / 2);
        }
    }

    #[test]
    fn halton_stays_in_the_unit_interval(k in 0usize..32, index in 0usize..10_000) {
        let prime = get_prime(k).unwrap();
        let value = halton(prime, index);
        prop_assert!((0.0..1.0).contains(&value));
        // consecutive radical inverses never repeat
        if index > 0 {
            prop_assert!(halton(prime, index - 1) != value);
        }
    }

    #[test]
    fn rgg_args_round_trip(n in 1usize..200, radius in 1e-3f64..10.0, seed in 0u64..1_000_000) {
        let args = format!("n={} radius={} seed={}", n, radius, seed);
        let generator = RggGen::new(&args).unwrap();
        prop_assert_eq!(generator.canonical_args(), args.as_str());
    }

    #[test]
    fn halton_dens_args_round_trip(n in 1usize..200, radius in 1e-3f64..10.0) {
        let space = RealVectorSpace::unit(2, 0.05).unwrap();
        let args = format!("n_perbatch={} radius_firstbatch={}", n, radius);
        let generator = HaltonDensGen::new(&space, &args).unwrap();
        prop_assert_eq!(generator.canonical_args(), args.as_str());
    }

    #[test]
    fn interior_schedule_density_and_bounds(
        ax in 0f64..1.0, ay in 0f64..1.0,
        bx in 0f64..1.0, by in 0f64..1.0,
        check_radius in 0.005f64..0.2,
    ) {
        let space = RealVectorSpace::unit(2, 2.0 * check_radius).unwrap();
        let a = State::new(vec![ax, ay]);
        let b = State::new(vec![bx, by]);
        let distance = space.distance(&a, &b);
        let mut perm = BisectPerm::new();
        let states = edge_interior_states(&space, &a, &b, distance, check_radius, &mut perm);
        prop_assert_eq!(states.len(), (distance / (2.0 * check_radius)).floor() as usize);
        for s in &states {
            for j in 0..2 {
                let lo = a.values()[j].min(b.values()[j]);
                let hi = a.values()[j].max(b.values()[j]);
                prop_assert!(lo - 1e-12 <= s.values()[j] && s.values()[j] <= hi + 1e-12);
            }
        }
    }

    #[test]
    fn effort_model_costs_are_monotone(
        subsets in prop::collection::vec((0.1f64..10.0, 0.05f64..1.0, any::<bool>()), 1..5),
        relation in any::<u8>(),
        target_pick in any::<u8>(),
    ) {
        let family = scripted_family(&subsets, relation);
        let target = target_pick as usize % subsets.len();
        let mut model = FamilyEffortModel::new(family).unwrap();
        model.set_target(target).unwrap();

        let probe = State::new(vec![0.0]);
        let mut tag = TAG_UNKNOWN;
        let mut steps = 0;
        while !model.is_evaled(tag) {
            prop_assert!(steps <= subsets.len());
            let before = model.p_hat(tag);
            prop_assert!(before.is_finite() && before > 0.0);
            // the optimistic bound never exceeds the policy chain
            prop_assert!(model.x_hat(tag) <= before + 1e-9);
            let passed = model.eval_partial(&mut tag, &probe);
            // once decided stays decided; the cost never climbs back up
            prop_assert!(model.p_hat(tag) <= before + 1e-9);
            if !passed {
                prop_assert!(model.is_evaled(tag));
                prop_assert!(model.x_hat(tag).is_infinite());
            }
            steps += 1;
        }
        prop_assert!(model.is_evaled(tag));
        prop_assert_eq!(model.p_hat(tag), 0.0);
    }

    #[test]
    fn lazy_weights_respect_known_invalid_tags(
        seed in 0u64..500,
        threshold in 0.2f64..0.8,
        coeff_checkcost in 0.0f64..3.0,
    ) {
        // one subset whose predicate fails right of a threshold; the goal
        // side always fails, so solves leave a mix of decided, failed, and
        // untouched tags behind
        let mut family = Family::new();
        family.add_subset(Subset::new(
            "free",
            1.5,
            0.5,
            Box::new(move |s: &State| s.values()[0] < threshold),
        ));
        let space = RealVectorSpace::unit(2, 0.05).unwrap();
        let args = format!("n=25 radius=0.35 seed={}", seed);
        let generator = roadmap_gen_from_id(&space, "rgg", &args).unwrap();
        let config = PlannerConfig {
            coeff_checkcost,
            ..PlannerConfig::default()
        };
        let mut planner = MultiSetPrm::new(space, family, generator, config, 1).unwrap();
        planner
            .set_problem(Problem {
                start: State::new(vec![0.05, 0.5]),
                goal: State::new(vec![0.95, 0.5]),
                target: 0,
            })
            .unwrap();
        planner.solve(&mut || false).unwrap();

        let model = planner.effort_model();
        let g = planner.roadmap();
        let mut infinite_edges = Vec::new();
        for i in 0..g.num_edges() {
            let edge = g.edge(EdgeId(i));
            let (u, v) = g.endpoints(EdgeId(i));
            let endpoint_tags = [g.vertex(u).tag, g.vertex(v).tag];
            let known_invalid = endpoint_tags
                .iter()
                .chain(edge.edge_tags.iter())
                .any(|&t| model.x_hat(t).is_infinite());
            if known_invalid {
                prop_assert!(edge.w_lazy.is_infinite());
                infinite_edges.push(i);
            } else {
                let checks: f64 = edge.edge_tags.iter().map(|&t| model.p_hat(t)).sum::<f64>()
                    + 0.5 * model.p_hat(endpoint_tags[0])
                    + 0.5 * model.p_hat(endpoint_tags[1]);
                let expected = edge.distance + coeff_checkcost * checks;
                prop_assert!(edge.w_lazy >= 0.0);
                prop_assert!((edge.w_lazy - expected).abs() < 1e-9);
            }
        }

        // infinite weights are absorbing across further solves
        planner.solve(&mut || false).unwrap();
        for i in infinite_edges {
            prop_assert!(planner.roadmap().edge(EdgeId(i)).w_lazy.is_infinite());
        }
    }

    #[test]
    fn overlay_apply_unapply_restores_the_core(
        seed in 0u64..2_000,
        n in 2usize..16,
        root_x in 0f64..1.0,
        root_y in 0f64..1.0,
    ) {
        let space = RealVectorSpace::unit(2, 0.05).unwrap();
        let args = format!("n={} radius=0.5 seed={}", n, seed);
        let mut generator = RggGen::new(&args).unwrap();
        let mut g = Roadmap::new();
        generator.generate(&space, &mut g, 1).unwrap();

        let vertices_before = g.num_vertices();
        let edges_before = g.num_edges();
        let states_before: Vec<Vec<f64>> = (0..vertices_before)
            .map(|i| g.vertex(VertexId(i)).state.values().to_vec())
            .collect();

        let root_state = State::new(vec![root_x, root_y]);
        let mut og = OverlayGraph::new();
        let root = og.add_root(root_state.clone());
        for i in 0..vertices_before {
            let v = VertexId(i);
            let dist = space.distance(&root_state, &g.vertex(v).state);
            if dist <= 0.4 {
                let anchor = og.add_anchor(v);
                og.add_edge(root, anchor, dist, Vec::new());
            }
        }

        for _ in 0..2 {
            og.apply(&mut g);
            prop_assert_eq!(g.num_vertices(), vertices_before + 1);
            og.unapply(&mut g);
            prop_assert_eq!(g.num_vertices(), vertices_before);
            prop_assert_eq!(g.num_edges(), edges_before);
            for (i, expected) in states_before.iter().enumerate() {
                prop_assert_eq!(g.vertex(VertexId(i)).state.values(), expected.as_slice());
            }
        }
    }
}
