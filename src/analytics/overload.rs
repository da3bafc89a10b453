//! Progressive-overload targets for the next session
//!
//! Built from a baseline day's working sets. Two plans are always produced,
//! add reps or add weight, and one is recommended from the average reps:
//! - below 6 reps: add reps
//! - above 12 reps: add weight
//! - in between: add reps (hypertrophy range)

use serde::{Deserialize, Serialize};

use crate::sets::WorkoutSet;

/// Mass added by the weight plan
pub const WEIGHT_INCREMENT: f64 = 2.5;

/// Sessions with more sets than this get the smaller rep bump
const CONSERVATIVE_SET_COUNT: usize = 3;

const LOW_REP_THRESHOLD: f64 = 6.0;
const HIGH_REP_THRESHOLD: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionPath {
    AddReps,
    AddWeight,
}

impl std::fmt::Display for ProgressionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddReps => write!(f, "add reps"),
            Self::AddWeight => write!(f, "add weight"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPlan {
    pub path: ProgressionPath,
    pub weight: f64,
    /// Target reps per set, in the order the sets were done
    pub reps: Vec<u32>,
}

impl TargetPlan {
    pub fn total_reps(&self) -> u64 {
        self.reps.iter().map(|&r| u64::from(r)).sum()
    }

    pub fn volume(&self) -> f64 {
        self.weight * self.total_reps() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionTargets {
    pub primary_weight: f64,
    pub rep_pattern: Vec<u32>,
    pub average_reps: f64,
    pub rep_plan: TargetPlan,
    pub weight_plan: TargetPlan,
    pub recommended: ProgressionPath,
}

impl ProgressionTargets {
    pub fn recommended_plan(&self) -> &TargetPlan {
        match self.recommended {
            ProgressionPath::AddReps => &self.rep_plan,
            ProgressionPath::AddWeight => &self.weight_plan,
        }
    }
}

/// Weight used by the most sets; on a tie the one seen first
pub fn primary_weight(sets: &[&WorkoutSet]) -> Option<f64> {
    // (weight, count) in first-seen order
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for set in sets {
        match counts.iter_mut().find(|(w, _)| *w == set.weight) {
            Some((_, count)) => *count += 1,
            None => counts.push((set.weight, 1)),
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for (weight, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((weight, count));
        }
    }
    best.map(|(weight, _)| weight)
}

/// Spread `extra` reps one per set starting with the first
pub fn distribute_reps(pattern: &[u32], extra: u32) -> Vec<u32> {
    let mut reps = pattern.to_vec();
    if reps.is_empty() {
        return reps;
    }
    for i in 0..extra as usize {
        let idx = i % reps.len();
        reps[idx] = reps[idx].saturating_add(1);
    }
    reps
}

pub fn recommend(average_reps: f64) -> ProgressionPath {
    if average_reps < LOW_REP_THRESHOLD {
        ProgressionPath::AddReps
    } else if average_reps > HIGH_REP_THRESHOLD {
        ProgressionPath::AddWeight
    } else {
        ProgressionPath::AddReps
    }
}

/// Targets from a baseline day's chronological working sets
pub fn generate(sets: &[&WorkoutSet]) -> Option<ProgressionTargets> {
    let primary = primary_weight(sets)?;

    let rep_pattern: Vec<u32> = sets
        .iter()
        .filter(|s| s.weight == primary)
        .map(|s| s.reps)
        .collect();

    let rep_sum: u64 = rep_pattern.iter().map(|&r| u64::from(r)).sum();
    let average_reps = rep_sum as f64 / rep_pattern.len() as f64;

    let extra = if sets.len() > CONSERVATIVE_SET_COUNT { 1 } else { 2 };

    let rep_plan = TargetPlan {
        path: ProgressionPath::AddReps,
        weight: primary,
        reps: distribute_reps(&rep_pattern, extra),
    };
    let weight_plan = TargetPlan {
        path: ProgressionPath::AddWeight,
        weight: primary + WEIGHT_INCREMENT,
        reps: rep_pattern.clone(),
    };

    Some(ProgressionTargets {
        primary_weight: primary,
        rep_pattern,
        average_reps,
        rep_plan,
        weight_plan,
        recommended: recommend(average_reps),
    })
}
