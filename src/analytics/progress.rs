//! Session-to-session progress comparison

use serde::{Deserialize, Serialize};

use super::metrics::SessionMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Same,
}

impl Direction {
    /// Strict comparison, no tolerance band
    pub fn between<T: PartialOrd>(current: T, previous: T) -> Self {
        if current > previous {
            Direction::Up
        } else if current < previous {
            Direction::Down
        } else {
            Direction::Same
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
            Direction::Same => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressComparison {
    /// Same exercise type on both sides and a previous session exists
    pub can_compare: bool,
    /// today.volume / last.volume x 100, rounded
    pub percentage: i64,
    /// (today - last) / last x 100, rounded
    pub gains_percent: i64,
    pub ratio: Option<f64>,
    pub volume: Direction,
    pub max_weight: Direction,
    pub total_reps: Direction,
}

/// Compare today's metrics with the last session.
///
/// Without a comparable last session, percentages are 0 and directions are
/// taken against an empty baseline.
pub fn compare(today: &SessionMetrics, last: Option<&SessionMetrics>) -> ProgressComparison {
    let comparable = last.filter(|l| l.exercise_type == today.exercise_type);

    let Some(last) = comparable else {
        return against_baseline(today, &SessionMetrics::empty(), false);
    };

    against_baseline(today, last, true)
}

fn against_baseline(today: &SessionMetrics, last: &SessionMetrics, can_compare: bool) -> ProgressComparison {
    let (percentage, gains_percent, ratio) = if can_compare && last.volume > 0.0 {
        let ratio = today.volume / last.volume;
        (
            (ratio * 100.0).round() as i64,
            ((today.volume - last.volume) / last.volume * 100.0).round() as i64,
            Some(ratio),
        )
    } else {
        (0, 0, None)
    };

    ProgressComparison {
        can_compare,
        percentage,
        gains_percent,
        ratio,
        volume: Direction::between(today.volume, last.volume),
        max_weight: Direction::between(today.max_weight, last.max_weight),
        total_reps: Direction::between(today.total_reps, last.total_reps),
    }
}
