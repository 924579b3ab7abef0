//! Common error definitions for multiset_prm
//!
//! This module provides the error type and result alias used across
//! the planner modules in this crate.

pub mod error;

pub use error::*;
