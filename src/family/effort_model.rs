//! Partial-evaluation effort model over a validity family.
//!
//! Every checked location (vertex or interior edge point) carries a tag: an
//! index into a table of partial-knowledge states. Tag 0 means nothing is
//! known; tag 1 is the absorbing state for locations that failed a check.
//! Each successful check moves a tag to the state that also contains every
//! validity deducible through the family relations.
//!
//! For the current target subset, the model answers three questions per tag:
//! whether the target's validity is already decided, the cost of the checks
//! the cheapest policy still has to run (see [`FamilyEffortModel::p_hat`]),
//! and an optimistic lower bound on that cost (infinite once the location is
//! known invalid). The policy itself is chosen by minimizing the expected
//! remaining cost; the reported cost is the policy's success-chain total,
//! which never increases along a performed transition. Tags are plain
//! integers and stay valid across retargeting; only their interpretation is
//! recomputed.

use std::collections::HashMap;

use crate::common::error::{PlannerError, PlannerResult};
use crate::family::{Family, SubsetId};
use crate::space::State;

/// Index into the effort model's knowledge table.
pub type Tag = usize;

/// Tag of locations with no knowledge.
pub const TAG_UNKNOWN: Tag = 0;

/// Absorbing tag for locations that failed a check.
pub const TAG_INVALID: Tag = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Knowledge {
    /// Per-subset flags: true when the location is known to satisfy that
    /// subset. Always closed under the family relations.
    Partial(Vec<bool>),
    /// A check failed here; the location is abandoned as invalid.
    Invalid,
}

#[derive(Debug, Clone)]
struct TagPlan {
    evaled: bool,
    p_hat: f64,
    x_hat: f64,
    next_check: Option<SubsetId>,
}

/// Effort model for one family and one target subset at a time.
pub struct FamilyEffortModel {
    family: Family,
    target: Option<SubsetId>,
    states: Vec<Knowledge>,
    interned: HashMap<Knowledge, Tag>,
    plans: Vec<TagPlan>,
    checks_performed: usize,
}

impl FamilyEffortModel {
    pub fn new(family: Family) -> PlannerResult<Self> {
        if family.is_empty() {
            return Err(PlannerError::EmptyFamily);
        }
        let unknown = Knowledge::Partial(vec![false; family.len()]);
        let states = vec![unknown.clone(), Knowledge::Invalid];
        let mut interned = HashMap::new();
        interned.insert(unknown, TAG_UNKNOWN);
        interned.insert(Knowledge::Invalid, TAG_INVALID);
        let plans = states
            .iter()
            .map(|_| TagPlan {
                evaled: false,
                p_hat: 0.0,
                x_hat: 0.0,
                next_check: None,
            })
            .collect();
        Ok(FamilyEffortModel {
            family,
            target: None,
            states,
            interned,
            plans,
            checks_performed: 0,
        })
    }

    pub fn family(&self) -> &Family {
        &self.family
    }

    pub fn target(&self) -> Option<SubsetId> {
        self.target
    }

    /// Number of membership predicate invocations so far.
    pub fn num_checks(&self) -> usize {
        self.checks_performed
    }

    /// Binds the target subset and rederives the plan of every live tag.
    pub fn set_target(&mut self, target: SubsetId) -> PlannerResult<()> {
        if target >= self.family.len() {
            return Err(PlannerError::BadArgs(format!(
                "target subset {} out of range (family has {} subsets)",
                target,
                self.family.len()
            )));
        }
        if self.target == Some(target) {
            return Ok(());
        }
        self.target = Some(target);
        let mut memo = HashMap::new();
        self.plans = self
            .states
            .iter()
            .map(|k| plan_knowledge(&self.family, target, k, &mut memo))
            .collect();
        Ok(())
    }

    /// True when the target's validity at this location is fully decided.
    pub fn is_evaled(&self, tag: Tag) -> bool {
        debug_assert!(self.target.is_some(), "effort model queried with no target");
        self.plans[tag].evaled
    }

    /// Remaining check cost if every check of the cheapest policy passes.
    ///
    /// Non-negative, zero once decided, and non-increasing along every
    /// transition performed by [`eval_partial`](Self::eval_partial): a
    /// passing check subtracts its own cost from the chain, and a failing
    /// check decides the location outright.
    pub fn p_hat(&self, tag: Tag) -> f64 {
        debug_assert!(self.target.is_some(), "effort model queried with no target");
        self.plans[tag].p_hat
    }

    /// Optimistic remaining check cost; infinite iff known invalid.
    pub fn x_hat(&self, tag: Tag) -> f64 {
        debug_assert!(self.target.is_some(), "effort model queried with no target");
        self.plans[tag].x_hat
    }

    /// Performs exactly one predicate evaluation, the cheapest transition out
    /// of the current tag, and advances the tag in place. Returns whether the
    /// predicate passed; on failure the tag lands on the invalid sink.
    pub fn eval_partial(&mut self, tag: &mut Tag, state: &State) -> bool {
        let plan = &self.plans[*tag];
        assert!(!plan.evaled, "eval_partial called on a decided tag");
        let subset_id = plan
            .next_check
            .expect("undecided tag always has a pending check");
        self.checks_performed += 1;
        let passed = self.family.subset(subset_id).check(state);
        let successor = if passed {
            match &self.states[*tag] {
                Knowledge::Partial(valid) => {
                    let mut valid = valid.clone();
                    valid[subset_id] = true;
                    Knowledge::Partial(close_valid(&self.family, valid))
                }
                Knowledge::Invalid => unreachable!("invalid tags are decided"),
            }
        } else {
            Knowledge::Invalid
        };
        *tag = self.intern(successor);
        passed
    }

    fn intern(&mut self, knowledge: Knowledge) -> Tag {
        if let Some(&tag) = self.interned.get(&knowledge) {
            return tag;
        }
        let target = self
            .target
            .expect("tags cannot advance before a target is set");
        let tag = self.states.len();
        let mut memo = HashMap::new();
        let plan = plan_knowledge(&self.family, target, &knowledge, &mut memo);
        self.states.push(knowledge.clone());
        self.interned.insert(knowledge, tag);
        self.plans.push(plan);
        tag
    }
}

/// Deductive closure of a set of known-valid subsets under the family
/// relations.
fn close_valid(family: &Family, mut valid: Vec<bool>) -> Vec<bool> {
    use crate::family::Relation;
    loop {
        let mut changed = false;
        for relation in family.relations() {
            match relation {
                Relation::Inclusion { sub, sup } => {
                    if valid[*sub] && !valid[*sup] {
                        valid[*sup] = true;
                        changed = true;
                    }
                }
                Relation::Intersection { whole, parts } => {
                    if valid[*whole] {
                        for p in parts {
                            if !valid[*p] {
                                valid[*p] = true;
                                changed = true;
                            }
                        }
                    } else if parts.iter().all(|p| valid[*p]) {
                        valid[*whole] = true;
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return valid;
        }
    }
}

/// Plan numbers for one knowledge state: the expected remaining cost that
/// drives the check choice, the chosen policy's success-chain cost (what
/// `p_hat` reports), the optimistic bound, and the next check.
type PlanEntry = (f64, f64, f64, Option<SubsetId>);

type PlanMemo = HashMap<Vec<bool>, PlanEntry>;

fn plan_knowledge(
    family: &Family,
    target: SubsetId,
    knowledge: &Knowledge,
    memo: &mut PlanMemo,
) -> TagPlan {
    match knowledge {
        Knowledge::Invalid => TagPlan {
            evaled: true,
            p_hat: 0.0,
            x_hat: f64::INFINITY,
            next_check: None,
        },
        Knowledge::Partial(valid) => {
            let (_, chain, x_hat, next_check) = plan_partial(family, target, valid, memo);
            TagPlan {
                evaled: valid[target],
                p_hat: chain,
                x_hat,
                next_check,
            }
        }
    }
}

/// Cheapest-policy recursion over success-only knowledge states. Checking a
/// subset costs its check cost; with the subset's prior probability the
/// location passes and knowledge grows (with deduction), otherwise the
/// location is abandoned and no further cost accrues. The check choice
/// minimizes the expected remaining cost; the reported cost is the chain of
/// check costs along the chosen policy's success branch, so it shrinks by
/// exactly the spent cost on every passing check. The recursion is finite
/// because the valid set grows strictly along every success edge.
fn plan_partial(
    family: &Family,
    target: SubsetId,
    valid: &[bool],
    memo: &mut PlanMemo,
) -> PlanEntry {
    if valid[target] {
        return (0.0, 0.0, 0.0, None);
    }
    if let Some(&entry) = memo.get(valid) {
        return entry;
    }
    let mut best_expected = f64::INFINITY;
    let mut best_chain = f64::INFINITY;
    let mut best_x = f64::INFINITY;
    let mut best_check = None;
    for s in 0..family.len() {
        if valid[s] {
            continue;
        }
        let mut successor = valid.to_vec();
        successor[s] = true;
        let successor = close_valid(family, successor);
        let (succ_expected, succ_chain, succ_x, _) =
            plan_partial(family, target, &successor, memo);
        let subset = family.subset(s);
        let expected = subset.check_cost() + subset.prior_valid() * succ_expected;
        if expected < best_expected {
            best_expected = expected;
            best_chain = subset.check_cost() + succ_chain;
            best_check = Some(s);
        }
        let x = subset.check_cost() + succ_x;
        if x < best_x {
            best_x = x;
        }
    }
    let entry = (best_expected, best_chain, best_x, best_check);
    memo.insert(valid.to_vec(), entry);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Relation, Subset};

    fn singleton_family(result: bool) -> Family {
        let mut family = Family::new();
        family.add_subset(Subset::new("only", 2.0, 0.75, Box::new(move |_| result)));
        family
    }

    #[test]
    fn test_single_subset_success() {
        let mut model = FamilyEffortModel::new(singleton_family(true)).unwrap();
        model.set_target(0).unwrap();
        let mut tag = TAG_UNKNOWN;
        assert!(!model.is_evaled(tag));
        assert!((model.p_hat(tag) - 2.0).abs() < 1e-12);
        assert!((model.x_hat(tag) - 2.0).abs() < 1e-12);

        assert!(model.eval_partial(&mut tag, &State::new(vec![0.0])));
        assert!(model.is_evaled(tag));
        assert_eq!(model.p_hat(tag), 0.0);
        assert_eq!(model.x_hat(tag), 0.0);
        assert_eq!(model.num_checks(), 1);
    }

    #[test]
    fn test_single_subset_failure_absorbs() {
        let mut model = FamilyEffortModel::new(singleton_family(false)).unwrap();
        model.set_target(0).unwrap();
        let mut tag = TAG_UNKNOWN;
        assert!(!model.eval_partial(&mut tag, &State::new(vec![0.0])));
        assert_eq!(tag, TAG_INVALID);
        assert!(model.is_evaled(tag));
        assert!(model.x_hat(tag).is_infinite());
        assert_eq!(model.p_hat(tag), 0.0);
    }

    #[test]
    fn test_intersection_prefers_cheap_parts() {
        // whole = a ∩ b; checking the parts is far cheaper than the whole.
        let mut family = Family::new();
        let whole = family.add_subset(Subset::new("whole", 10.0, 0.9, Box::new(|_| true)));
        let a = family.add_subset(Subset::new("a", 1.0, 0.5, Box::new(|_| true)));
        let b = family.add_subset(Subset::new("b", 1.0, 0.5, Box::new(|_| true)));
        family.add_relation(Relation::Intersection {
            whole,
            parts: vec![a, b],
        });
        let mut model = FamilyEffortModel::new(family).unwrap();
        model.set_target(whole).unwrap();

        // the policy proves the parts (1 + 1) instead of paying 10 direct
        assert!((model.p_hat(TAG_UNKNOWN) - 2.0).abs() < 1e-12);

        let mut tag = TAG_UNKNOWN;
        assert!(model.eval_partial(&mut tag, &State::new(vec![0.0])));
        assert!(!model.is_evaled(tag));
        assert!((model.p_hat(tag) - 1.0).abs() < 1e-12);
        assert!(model.eval_partial(&mut tag, &State::new(vec![0.0])));
        // both parts valid, whole deduced
        assert!(model.is_evaled(tag));
        assert_eq!(model.num_checks(), 2);
    }

    #[test]
    fn test_inclusion_deduces_superset() {
        // a ⊆ b, so a cheap a-check also decides b.
        let mut family = Family::new();
        let a = family.add_subset(Subset::new("a", 1.0, 0.9, Box::new(|_| true)));
        let b = family.add_subset(Subset::new("b", 5.0, 0.5, Box::new(|_| true)));
        family.add_relation(Relation::Inclusion { sub: a, sup: b });
        let mut model = FamilyEffortModel::new(family).unwrap();
        model.set_target(b).unwrap();

        assert!((model.p_hat(TAG_UNKNOWN) - 1.0).abs() < 1e-12);
        let mut tag = TAG_UNKNOWN;
        assert!(model.eval_partial(&mut tag, &State::new(vec![0.0])));
        assert!(model.is_evaled(tag));
    }

    #[test]
    fn test_p_hat_monotone_along_transitions() {
        // the policy tries the cheap unlikely check first; the reported cost
        // must still shrink when that check happens to pass
        let mut family = Family::new();
        let whole = family.add_subset(Subset::new("whole", 4.0, 0.9, Box::new(|_| true)));
        let a = family.add_subset(Subset::new("a", 1.0, 0.4, Box::new(|_| true)));
        let b = family.add_subset(Subset::new("b", 2.0, 0.6, Box::new(|_| true)));
        family.add_relation(Relation::Intersection {
            whole,
            parts: vec![a, b],
        });
        let mut model = FamilyEffortModel::new(family).unwrap();
        model.set_target(whole).unwrap();

        // chain is a (1) then b (2)
        let mut tag = TAG_UNKNOWN;
        assert!((model.p_hat(tag) - 3.0).abs() < 1e-12);

        let mut steps = 0;
        while !model.is_evaled(tag) {
            let before = model.p_hat(tag);
            assert!(before.is_finite() && before > 0.0);
            assert!(model.x_hat(tag) <= before + 1e-12);
            assert!(model.eval_partial(&mut tag, &State::new(vec![0.0])));
            assert!(model.p_hat(tag) <= before);
            steps += 1;
            assert!(steps <= 3);
        }
        // decided tags stay decided and cost nothing more
        assert!(model.is_evaled(tag));
        assert_eq!(model.p_hat(tag), 0.0);
        assert_eq!(model.num_checks(), steps);
    }

    #[test]
    fn test_retarget_keeps_tags() {
        let mut family = Family::new();
        let a = family.add_subset(Subset::new("a", 1.0, 0.9, Box::new(|_| true)));
        let b = family.add_subset(Subset::new("b", 3.0, 0.5, Box::new(|_| true)));
        family.add_relation(Relation::Inclusion { sub: a, sup: b });
        let mut model = FamilyEffortModel::new(family).unwrap();
        model.set_target(a).unwrap();

        let mut tag = TAG_UNKNOWN;
        assert!(model.eval_partial(&mut tag, &State::new(vec![0.0])));
        assert!(model.is_evaled(tag));

        // a implies b, so the advanced tag is decided under the new target too
        model.set_target(b).unwrap();
        assert!(model.is_evaled(tag));
        // the blank tag now plans for b instead
        assert!(!model.is_evaled(TAG_UNKNOWN));
        assert!((model.p_hat(TAG_UNKNOWN) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_family_rejected() {
        assert!(matches!(
            FamilyEffortModel::new(Family::new()),
            Err(PlannerError::EmptyFamily)
        ));
    }
}
