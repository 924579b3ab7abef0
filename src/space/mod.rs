//! Configuration states and the space adapter contract.
//!
//! The planner only ever touches configurations through [`StateSpace`], so
//! alternative spaces (weighted metrics, wrapped joints) can be plugged in by
//! implementing the trait. [`RealVectorSpace`] is the concrete space shipped
//! with this crate: an axis-aligned box with Euclidean distance.

use nalgebra::DVector;
use rand::RngCore;

use crate::common::error::{PlannerError, PlannerResult};

/// An owned configuration point.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    values: DVector<f64>,
}

impl State {
    pub fn new(values: Vec<f64>) -> Self {
        State {
            values: DVector::from_vec(values),
        }
    }

    pub fn zeros(dim: usize) -> Self {
        State {
            values: DVector::zeros(dim),
        }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        self.values.as_slice()
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        self.values.as_mut_slice()
    }
}

/// Contract the planner requires from a configuration space.
pub trait StateSpace {
    fn dimension(&self) -> usize;

    fn bounds_low(&self, i: usize) -> f64;

    fn bounds_high(&self, i: usize) -> f64;

    /// Non-negative distance between two configurations.
    fn distance(&self, a: &State, b: &State) -> f64;

    /// Writes the configuration at parameter `t` in [0, 1] along the local
    /// path from `a` to `b` into `out`.
    fn interpolate(&self, a: &State, b: &State, t: f64, out: &mut State);

    fn copy_state(&self, from: &State, out: &mut State);

    fn alloc_state(&self) -> State;

    fn sample_uniform(&self, rng: &mut dyn RngCore, out: &mut State);

    /// Spacing constant for collision checking along local paths.
    fn longest_valid_segment_length(&self) -> f64;

    /// True when states are plain bounded real vectors. Generators that
    /// write coordinates directly require this.
    fn is_real_vector(&self) -> bool {
        false
    }
}

/// Axis-aligned box in R^d with Euclidean distance.
#[derive(Debug, Clone)]
pub struct RealVectorSpace {
    low: Vec<f64>,
    high: Vec<f64>,
    longest_valid_segment: f64,
}

impl RealVectorSpace {
    pub fn new(low: Vec<f64>, high: Vec<f64>, longest_valid_segment: f64) -> PlannerResult<Self> {
        if low.is_empty() || low.len() != high.len() {
            return Err(PlannerError::BadArgs(
                "space bounds must be non-empty and of equal dimension".to_string(),
            ));
        }
        if low.iter().zip(high.iter()).any(|(l, h)| l > h) {
            return Err(PlannerError::BadArgs(
                "space lower bound exceeds upper bound".to_string(),
            ));
        }
        if !(longest_valid_segment > 0.0) {
            return Err(PlannerError::BadArgs(
                "longest valid segment length must be positive".to_string(),
            ));
        }
        Ok(RealVectorSpace {
            low,
            high,
            longest_valid_segment,
        })
    }

    /// The unit box [0, 1]^dim.
    pub fn unit(dim: usize, longest_valid_segment: f64) -> PlannerResult<Self> {
        Self::new(vec![0.0; dim], vec![1.0; dim], longest_valid_segment)
    }
}

// 53-bit uniform draw in [0, 1). Written out explicitly so the sample stream
// depends only on the generator, not on distribution internals.
fn uniform_01(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

impl StateSpace for RealVectorSpace {
    fn dimension(&self) -> usize {
        self.low.len()
    }

    fn bounds_low(&self, i: usize) -> f64 {
        self.low[i]
    }

    fn bounds_high(&self, i: usize) -> f64 {
        self.high[i]
    }

    fn distance(&self, a: &State, b: &State) -> f64 {
        (&a.values - &b.values).norm()
    }

    fn interpolate(&self, a: &State, b: &State, t: f64, out: &mut State) {
        out.values = &a.values + (&b.values - &a.values) * t;
    }

    fn copy_state(&self, from: &State, out: &mut State) {
        out.values = from.values.clone();
    }

    fn alloc_state(&self) -> State {
        State::zeros(self.dimension())
    }

    fn sample_uniform(&self, rng: &mut dyn RngCore, out: &mut State) {
        for i in 0..self.low.len() {
            let u = uniform_01(rng);
            out.values[i] = self.low[i] + (self.high[i] - self.low[i]) * u;
        }
    }

    fn longest_valid_segment_length(&self) -> f64 {
        self.longest_valid_segment
    }

    fn is_real_vector(&self) -> bool {
        true
    }
}
