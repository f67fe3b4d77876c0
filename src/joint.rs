use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::distribution::GoalDistribution;
use crate::error::{ModelError, Result};

/// Joint tail above this share marks a matrix as unreliable.
pub const DEFAULT_TAIL_WARN_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scoreline {
    pub home: usize,
    pub away: usize,
}

impl Scoreline {
    pub const fn new(home: usize, away: usize) -> Self {
        Self { home, away }
    }

    pub fn total(&self) -> usize {
        self.home + self.away
    }

    /// Accepts the "h-a" form used by correct-score keys.
    pub fn parse(raw: &str) -> Option<Self> {
        let (h, a) = raw.trim().split_once('-')?;
        Some(Self {
            home: h.trim().parse().ok()?,
            away: a.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for Scoreline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// Quality signal: the grid leaves out too much probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TailMassWarning {
    pub tail_mass: f64,
    pub threshold: f64,
}

/// Scoreline probabilities for one period, home and away assumed independent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointMatrix {
    side: usize,
    cells: Vec<f64>,
    total_mass: f64,
    tail_mass: f64,
    warning: Option<TailMassWarning>,
}

impl JointMatrix {
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn max_goals(&self) -> usize {
        self.side - 1
    }

    pub fn get(&self, home: usize, away: usize) -> f64 {
        if home >= self.side || away >= self.side {
            return 0.0;
        }
        self.cells[home * self.side + away]
    }

    pub fn prob(&self, score: Scoreline) -> f64 {
        self.get(score.home, score.away)
    }

    pub fn row(&self, home: usize) -> Option<&[f64]> {
        (home < self.side).then(|| &self.cells[home * self.side..(home + 1) * self.side])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Scoreline, f64)> + '_ {
        let side = self.side;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, p)| (Scoreline::new(idx / side, idx % side), *p))
    }

    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    pub fn tail_mass(&self) -> f64 {
        self.tail_mass
    }

    pub fn warning(&self) -> Option<TailMassWarning> {
        self.warning
    }

    pub fn is_reliable(&self) -> bool {
        self.warning.is_none()
    }
}

/// Outer product of two goal distributions.
///
/// There is no correlation term: independence between the sides is a
/// modelling assumption, not an approximation of something richer.
pub fn build_joint(home: &GoalDistribution, away: &GoalDistribution) -> Result<JointMatrix> {
    build_joint_with_threshold(home, away, DEFAULT_TAIL_WARN_THRESHOLD)
}

pub fn build_joint_with_threshold(
    home: &GoalDistribution,
    away: &GoalDistribution,
    tail_warn_threshold: f64,
) -> Result<JointMatrix> {
    let (h, a) = (home.probs(), away.probs());
    if h.len() != a.len() {
        return Err(ModelError::GridMismatch {
            home: h.len(),
            away: a.len(),
        });
    }

    let side = h.len();
    let mut cells = Vec::with_capacity(side * side);
    for ph in h {
        cells.extend(a.iter().map(|pa| ph * pa));
    }

    let total_mass = home.covered_mass() * away.covered_mass();
    let tail_mass = 1.0 - total_mass;

    let warning = (tail_mass > tail_warn_threshold).then(|| {
        warn!(
            tail_mass,
            threshold = tail_warn_threshold,
            max_goals = side - 1,
            "joint grid truncates a large share of probability"
        );
        TailMassWarning {
            tail_mass,
            threshold: tail_warn_threshold,
        }
    });

    Ok(JointMatrix {
        side,
        cells,
        total_mass,
        tail_mass,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{MAX_GOALS, build_distribution};

    #[test]
    fn scoreline_key_roundtrips_through_display() {
        let s = Scoreline::parse(" 3-1 ").unwrap();
        assert_eq!(s, Scoreline::new(3, 1));
        assert_eq!(s.to_string(), "3-1");
        assert!(Scoreline::parse("3:1").is_none());
        assert!(Scoreline::parse("a-1").is_none());
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let h = build_distribution(1.0, 0.0, 7).unwrap();
        let a = build_distribution(1.0, 0.0, 5).unwrap();
        assert_eq!(
            build_joint(&h, &a),
            Err(ModelError::GridMismatch { home: 8, away: 6 })
        );
    }

    #[test]
    fn cells_are_products_of_marginals() {
        let h = build_distribution(1.4, 0.05, MAX_GOALS).unwrap();
        let a = build_distribution(0.9, 0.0, MAX_GOALS).unwrap();
        let j = build_joint(&h, &a).unwrap();
        for (s, p) in j.iter() {
            assert_eq!(p, h.get(s.home) * a.get(s.away));
        }
        assert_eq!(j.row(2).map(|r| r[3]), Some(j.get(2, 3)));
        assert_eq!(j.row(MAX_GOALS + 1), None);
        assert_eq!(j.get(8, 0), 0.0);
    }

    #[test]
    fn high_scoring_inputs_raise_tail_warning() {
        let h = build_distribution(5.0, 0.0, MAX_GOALS).unwrap();
        let a = build_distribution(4.0, 0.0, MAX_GOALS).unwrap();
        let j = build_joint(&h, &a).unwrap();
        let w = j.warning().expect("warning");
        assert!(w.tail_mass > 0.01);
        assert!(!j.is_reliable());

        let h = build_distribution(1.2, 0.0, MAX_GOALS).unwrap();
        let a = build_distribution(1.0, 0.0, MAX_GOALS).unwrap();
        assert!(build_joint(&h, &a).unwrap().is_reliable());
    }
}
