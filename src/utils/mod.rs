//! Deterministic sequence utilities: primes, Halton radical inverse,
//! and the bisection permutation used to order interior edge checks.

use std::collections::{HashMap, VecDeque};

/// First primes, one per configuration-space dimension.
const PRIMES: [u64; 32] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131,
];

/// Returns the (k+1)-th prime from the hardcoded table, or `None` when the
/// table is too small for the requested index.
pub fn get_prime(k: usize) -> Option<u64> {
    PRIMES.get(k).copied()
}

/// Radical inverse of `index` in base `prime`, in [0, 1).
pub fn halton(prime: u64, index: usize) -> f64 {
    let mut result = 0.0;
    let mut f = 1.0;
    let mut i = index as u64;
    while i > 0 {
        f /= prime as f64;
        result += f * (i % prime) as f64;
        i /= prime;
    }
    result
}

/// Cached bisection permutations of `[0..n)`.
///
/// The permutation visits the middle index first, then the midpoints of the
/// two halves, and so on level by level; within a level, lower indices come
/// first. Checking edge interiors in this order surfaces mid-edge failures
/// as early as possible.
#[derive(Debug, Default)]
pub struct BisectPerm {
    cache: HashMap<usize, Vec<usize>>,
}

impl BisectPerm {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bisection permutation of `[0..n)`.
    pub fn get(&mut self, n: usize) -> &[usize] {
        self.cache.entry(n).or_insert_with(|| Self::compute(n))
    }

    fn compute(n: usize) -> Vec<usize> {
        let mut order = Vec::with_capacity(n);
        let mut segments = VecDeque::new();
        if n > 0 {
            segments.push_back((0usize, n));
        }
        while let Some((lo, hi)) = segments.pop_front() {
            let mid = lo + (hi - lo) / 2;
            order.push(mid);
            if lo < mid {
                segments.push_back((lo, mid));
            }
            if mid + 1 < hi {
                segments.push_back((mid + 1, hi));
            }
        }
        order
    }
}
