//! Validity-context families.
//!
//! A family is a labeled collection of validity subsets of the configuration
//! space, plus the known set relations between them. Each subset owns a
//! membership predicate (the expensive check), the cost of running that
//! check, and a prior probability that an arbitrary configuration passes it.
//! Relations let the effort model deduce one subset's validity from others
//! instead of paying for a direct check.

pub mod effort_model;

pub use effort_model::{FamilyEffortModel, Tag, TAG_INVALID, TAG_UNKNOWN};

use crate::space::State;

/// Index of a subset within its family.
pub type SubsetId = usize;

/// Membership predicate for one validity subset.
pub type Predicate = Box<dyn Fn(&State) -> bool>;

/// One validity context.
pub struct Subset {
    name: String,
    check_cost: f64,
    prior_valid: f64,
    predicate: Predicate,
}

impl Subset {
    /// `check_cost` must be positive; `prior_valid` must lie in (0, 1].
    pub fn new(
        name: impl Into<String>,
        check_cost: f64,
        prior_valid: f64,
        predicate: Predicate,
    ) -> Self {
        assert!(check_cost > 0.0, "subset check cost must be positive");
        assert!(
            prior_valid > 0.0 && prior_valid <= 1.0,
            "subset validity prior must be in (0, 1]"
        );
        Subset {
            name: name.into(),
            check_cost,
            prior_valid,
            predicate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check_cost(&self) -> f64 {
        self.check_cost
    }

    pub fn prior_valid(&self) -> f64 {
        self.prior_valid
    }

    /// Runs the membership predicate on one configuration.
    pub fn check(&self, state: &State) -> bool {
        (self.predicate)(state)
    }
}

impl std::fmt::Debug for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subset")
            .field("name", &self.name)
            .field("check_cost", &self.check_cost)
            .field("prior_valid", &self.prior_valid)
            .finish()
    }
}

/// A set equation between subsets of the same family.
#[derive(Debug, Clone)]
pub enum Relation {
    /// `sub` is contained in `sup`.
    Inclusion { sub: SubsetId, sup: SubsetId },
    /// `whole` is the intersection of `parts`.
    Intersection { whole: SubsetId, parts: Vec<SubsetId> },
}

/// Subsets plus the relations among them.
#[derive(Debug, Default)]
pub struct Family {
    subsets: Vec<Subset>,
    relations: Vec<Relation>,
}

impl Family {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subset(&mut self, subset: Subset) -> SubsetId {
        self.subsets.push(subset);
        self.subsets.len() - 1
    }

    pub fn add_relation(&mut self, relation: Relation) {
        match &relation {
            Relation::Inclusion { sub, sup } => {
                assert!(*sub < self.subsets.len() && *sup < self.subsets.len());
            }
            Relation::Intersection { whole, parts } => {
                assert!(*whole < self.subsets.len());
                assert!(!parts.is_empty());
                assert!(parts.iter().all(|p| *p < self.subsets.len()));
            }
        }
        self.relations.push(relation);
    }

    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }

    pub fn subset(&self, id: SubsetId) -> &Subset {
        &self.subsets[id]
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }
}
