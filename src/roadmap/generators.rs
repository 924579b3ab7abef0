//! Roadmap generators.
//!
//! A generator is stateful: constructed with a space and a canonical argument
//! string, it extends a roadmap batch by batch on demand and keeps progress
//! counters so successive calls continue instead of restarting. The argument
//! string must round-trip bit-identically through the canonical formatter so
//! persisted roadmaps can be keyed by it.

use rand_pcg::Pcg64;

use crate::common::error::{PlannerError, PlannerResult};
use crate::family::TAG_UNKNOWN;
use crate::roadmap::graph::{Roadmap, Vertex, VertexId};
use crate::space::StateSpace;
use crate::utils::{get_prime, halton};

/// Batchwise roadmap construction.
pub trait RoadmapGen {
    /// The canonical argument string this generator was built from.
    fn canonical_args(&self) -> &str;

    /// Maximum number of batches this generator can produce, if bounded.
    fn batch_cap(&self) -> Option<usize>;

    fn num_batches_generated(&self) -> usize;

    /// Extends `g` until `target_batches` batches exist. Already-generated
    /// batches are never recomputed.
    fn generate(
        &mut self,
        space: &dyn StateSpace,
        g: &mut Roadmap,
        target_batches: usize,
    ) -> PlannerResult<()>;
}

/// Constructs a generator from its published type name.
pub fn roadmap_gen_from_id(
    space: &dyn StateSpace,
    gen_type: &str,
    args: &str,
) -> PlannerResult<Box<dyn RoadmapGen>> {
    match gen_type {
        "rgg" => Ok(Box::new(RggGen::new(args)?)),
        "halton_dens" => Ok(Box::new(HaltonDensGen::new(space, args)?)),
        other => Err(PlannerError::BadArgs(format!(
            "unknown roadmap type `{}`",
            other
        ))),
    }
}

/// Splits `key=value` fields out of an argument string, in the given order.
fn parse_fields<'a>(args: &'a str, keys: &[&str]) -> PlannerResult<Vec<&'a str>> {
    let mut parts = args.split(' ');
    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        let part = parts
            .next()
            .ok_or_else(|| PlannerError::BadArgs(format!("missing field `{}`", key)))?;
        let value = part
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| PlannerError::BadArgs(format!("expected field `{}=`", key)))?;
        values.push(value);
    }
    if parts.next().is_some() {
        return Err(PlannerError::BadArgs(
            "trailing fields in argument string".to_string(),
        ));
    }
    Ok(values)
}

fn parse_value<T: std::str::FromStr>(value: &str, key: &str) -> PlannerResult<T> {
    value
        .parse()
        .map_err(|_| PlannerError::BadArgs(format!("cannot parse field `{}={}`", key, value)))
}

/// Random geometric graph, single batch.
///
/// Samples `n` configurations with a seeded generator and connects every pair
/// within `radius`. The sampler is a `Pcg64` so the stream, and therefore the
/// roadmap, is stable for a given seed across platforms and releases.
pub struct RggGen {
    args: String,
    n: usize,
    radius: f64,
    rng: Pcg64,
    batches_generated: usize,
}

impl RggGen {
    pub fn new(args: &str) -> PlannerResult<Self> {
        let fields = parse_fields(args, &["n", "radius", "seed"])?;
        let n: usize = parse_value(fields[0], "n")?;
        let radius: f64 = parse_value(fields[1], "radius")?;
        let seed: u64 = parse_value(fields[2], "seed")?;
        let canonical = format!("n={} radius={} seed={}", n, radius, seed);
        if canonical != args {
            return Err(PlannerError::BadArgs(format!(
                "args not in canonical form (expected `{}`)",
                canonical
            )));
        }
        if !(radius > 0.0) {
            return Err(PlannerError::BadArgs("radius must be positive".to_string()));
        }
        Ok(RggGen {
            args: canonical,
            n,
            radius,
            rng: Pcg64::new(u128::from(seed), u128::from(seed)),
            batches_generated: 0,
        })
    }
}

impl RoadmapGen for RggGen {
    fn canonical_args(&self) -> &str {
        &self.args
    }

    fn batch_cap(&self) -> Option<usize> {
        Some(1)
    }

    fn num_batches_generated(&self) -> usize {
        self.batches_generated
    }

    fn generate(
        &mut self,
        space: &dyn StateSpace,
        g: &mut Roadmap,
        target_batches: usize,
    ) -> PlannerResult<()> {
        if target_batches > 1 {
            return Err(PlannerError::BadArgs(format!(
                "rgg generates a single batch, {} requested",
                target_batches
            )));
        }
        if target_batches == 0 || self.batches_generated >= target_batches {
            return Ok(());
        }
        while g.num_vertices() < self.n {
            let mut state = space.alloc_state();
            space.sample_uniform(&mut self.rng, &mut state);
            let v_new = g.add_vertex(Vertex {
                state,
                subgraph: 0,
                is_shadow: false,
                tag: TAG_UNKNOWN,
            });
            for other in 0..v_new.0 {
                let v_other = VertexId(other);
                let dist = space.distance(&g.vertex(v_new).state, &g.vertex(v_other).state);
                if self.radius < dist {
                    continue;
                }
                g.add_edge(v_new, v_other, dist, 0);
            }
        }
        self.batches_generated = 1;
        Ok(())
    }
}

/// Halton-densified roadmap, unbounded batches.
///
/// Batch `k` grows the vertex set to `(k+1) * n_perbatch` configurations
/// placed by the Halton sequence (one prime base per coordinate, indexed by
/// the global vertex counter) and connects each new vertex to every existing
/// vertex within `radius_firstbatch * (k+1)^(-1/d)`. Edges from earlier
/// batches keep their larger radius.
pub struct HaltonDensGen {
    args: String,
    n_perbatch: usize,
    radius_firstbatch: f64,
    dim: usize,
    batches_generated: usize,
    /// Global placement counter; Halton indices never restart across batches.
    vertices_generated: usize,
}

impl HaltonDensGen {
    pub fn new(space: &dyn StateSpace, args: &str) -> PlannerResult<Self> {
        if !space.is_real_vector() {
            return Err(PlannerError::BadArgs(
                "halton_dens requires a real-vector space".to_string(),
            ));
        }
        let dim = space.dimension();
        if dim == 0 || get_prime(dim - 1).is_none() {
            return Err(PlannerError::BadArgs(format!(
                "not enough hardcoded primes for dimension {}",
                dim
            )));
        }
        let fields = parse_fields(args, &["n_perbatch", "radius_firstbatch"])?;
        let n_perbatch: usize = parse_value(fields[0], "n_perbatch")?;
        let radius_firstbatch: f64 = parse_value(fields[1], "radius_firstbatch")?;
        let canonical = format!(
            "n_perbatch={} radius_firstbatch={}",
            n_perbatch, radius_firstbatch
        );
        if canonical != args {
            return Err(PlannerError::BadArgs(format!(
                "args not in canonical form (expected `{}`)",
                canonical
            )));
        }
        if n_perbatch == 0 || !(radius_firstbatch > 0.0) {
            return Err(PlannerError::BadArgs(
                "n_perbatch and radius_firstbatch must be positive".to_string(),
            ));
        }
        Ok(HaltonDensGen {
            args: canonical,
            n_perbatch,
            radius_firstbatch,
            dim,
            batches_generated: 0,
            vertices_generated: 0,
        })
    }
}

impl RoadmapGen for HaltonDensGen {
    fn canonical_args(&self) -> &str {
        &self.args
    }

    fn batch_cap(&self) -> Option<usize> {
        None
    }

    fn num_batches_generated(&self) -> usize {
        self.batches_generated
    }

    fn generate(
        &mut self,
        space: &dyn StateSpace,
        g: &mut Roadmap,
        target_batches: usize,
    ) -> PlannerResult<()> {
        while self.batches_generated < target_batches {
            let k = self.batches_generated;
            let radius =
                self.radius_firstbatch * (1.0 / (k as f64 + 1.0)).powf(1.0 / self.dim as f64);
            while g.num_vertices() < (k + 1) * self.n_perbatch {
                let mut values = vec![0.0; self.dim];
                for (j, value) in values.iter_mut().enumerate() {
                    let prime = get_prime(j).expect("prime table checked at construction");
                    *value = space.bounds_low(j)
                        + (space.bounds_high(j) - space.bounds_low(j))
                            * halton(prime, self.vertices_generated);
                }
                let v_new = g.add_vertex(Vertex {
                    state: crate::space::State::new(values),
                    subgraph: k,
                    is_shadow: false,
                    tag: TAG_UNKNOWN,
                });
                for other in 0..v_new.0 {
                    let v_other = VertexId(other);
                    let dist = space.distance(&g.vertex(v_new).state, &g.vertex(v_other).state);
                    if radius < dist {
                        continue;
                    }
                    g.add_edge(v_new, v_other, dist, k);
                }
                self.vertices_generated += 1;
            }
            self.batches_generated += 1;
        }
        Ok(())
    }
}
