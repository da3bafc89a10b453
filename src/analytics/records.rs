//! Personal record detection
//!
//! The record is never patched incrementally. Every mutation that can move it
//! recomputes the winner from the full set collection of the exercise:
//! - heaviest weight wins
//! - equal weight: more reps wins
//! - equal weight and reps: the earlier set keeps the record
//!
//! Bodyweight exercises (all weights zero) fall through to reps alone.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::WorkingSetRule;
use crate::sets::WorkoutSet;

/// Population eligible for the record
pub const RECORD_RULE: WorkingSetRule = WorkingSetRule::ExcludeWarmUpAndBonus;

/// `Greater` when `a` ranks above `b` as a record
pub fn compare_for_record(a: &WorkoutSet, b: &WorkoutSet) -> Ordering {
    a.weight
        .total_cmp(&b.weight)
        .then(a.reps.cmp(&b.reps))
        .then(b.timestamp.cmp(&a.timestamp))
}

/// Best eligible set, if any
pub fn find_personal_record<'a, I>(sets: I) -> Option<&'a WorkoutSet>
where
    I: IntoIterator<Item = &'a WorkoutSet>,
{
    sets.into_iter()
        .filter(|s| RECORD_RULE.includes(s))
        .max_by(|a, b| compare_for_record(a, b))
}

/// Flag changes produced by one recompute pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    pub previous: Option<i64>,
    pub current: Option<i64>,
    /// Ids whose `is_pb` flag flipped; these need writing back
    pub changed: Vec<i64>,
}

impl RecordChange {
    pub fn holder_changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Clear every `is_pb` flag and set it on the winner.
///
/// `sets` must hold every set of one exercise. Sets without an id can win
/// but are not reported in `changed`.
pub fn recompute(sets: &mut [WorkoutSet]) -> RecordChange {
    let previous = sets.iter().find(|s| s.is_pb).and_then(|s| s.id);

    let winner = sets
        .iter()
        .enumerate()
        .filter(|(_, s)| RECORD_RULE.includes(s))
        .max_by(|(_, a), (_, b)| compare_for_record(a, b))
        .map(|(idx, _)| idx);

    let mut changed = Vec::new();
    for (idx, set) in sets.iter_mut().enumerate() {
        let should_hold = Some(idx) == winner;
        if set.is_pb != should_hold {
            set.is_pb = should_hold;
            if let Some(id) = set.id {
                changed.push(id);
            }
        }
    }

    RecordChange {
        previous,
        current: winner.and_then(|idx| sets[idx].id),
        changed,
    }
}

/// At most one flagged set, and it is the computed winner
pub fn is_consistent(sets: &[WorkoutSet]) -> bool {
    let flagged: Vec<_> = sets.iter().filter(|s| s.is_pb).collect();
    match (flagged.as_slice(), find_personal_record(sets)) {
        ([], None) => true,
        ([holder], Some(best)) => holder.id == best.id && holder.timestamp == best.timestamp,
        _ => false,
    }
}
