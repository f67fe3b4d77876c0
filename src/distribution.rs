use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

pub const MAX_GOALS: usize = 7;

/// One side's scoring model for a single period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringParameters {
    pub lambda: f64,
    /// Extra probability mass placed on "no goals".
    #[serde(default)]
    pub zero_inflation: f64,
}

impl ScoringParameters {
    pub fn new(lambda: f64, zero_inflation: f64) -> Result<Self> {
        let params = Self {
            lambda,
            zero_inflation,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn poisson(lambda: f64) -> Result<Self> {
        Self::new(lambda, 0.0)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(ModelError::invalid(
                "lambda",
                self.lambda,
                "expected goals must be finite and >= 0",
            ));
        }
        if !self.zero_inflation.is_finite() || !(0.0..=1.0).contains(&self.zero_inflation) {
            return Err(ModelError::invalid(
                "zero_inflation",
                self.zero_inflation,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            lambda: self.lambda * factor,
            zero_inflation: self.zero_inflation,
        }
    }
}

/// Truncated (optionally zero-inflated) Poisson mass over goal counts `0..=max_goals`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalDistribution {
    probs: Vec<f64>,
    tail_mass: f64,
}

impl GoalDistribution {
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    pub fn get(&self, goals: usize) -> f64 {
        self.probs.get(goals).copied().unwrap_or(0.0)
    }

    pub fn max_goals(&self) -> usize {
        self.probs.len() - 1
    }

    pub fn tail_mass(&self) -> f64 {
        self.tail_mass
    }

    pub fn covered_mass(&self) -> f64 {
        self.probs.iter().sum()
    }

    pub fn grid_mean(&self) -> f64 {
        self.probs
            .iter()
            .enumerate()
            .map(|(k, p)| k as f64 * p)
            .sum()
    }
}

/// Builds one side's goal distribution.
///
/// `k = 0` takes `pi + (1 - pi) * poisson(0)`, every `k > 0` takes
/// `(1 - pi) * poisson(k)`. Mass above `max_goals` is reported as the tail.
pub fn build_distribution(
    lambda: f64,
    zero_inflation: f64,
    max_goals: usize,
) -> Result<GoalDistribution> {
    let params = ScoringParameters::new(lambda, zero_inflation)?;
    Ok(build_from_params(&params, max_goals))
}

pub(crate) fn build_from_params(params: &ScoringParameters, max_goals: usize) -> GoalDistribution {
    let pi = params.zero_inflation;
    let standard = poisson_pmf(params.lambda, max_goals);

    let probs: Vec<f64> = standard
        .iter()
        .enumerate()
        .map(|(k, p)| {
            if k == 0 {
                pi + (1.0 - pi) * p
            } else {
                (1.0 - pi) * p
            }
        })
        .collect();

    let tail_mass = (1.0 - probs.iter().sum::<f64>()).max(0.0);
    GoalDistribution { probs, tail_mass }
}

// Iterative p_k = p_{k-1} * lambda / k, so no factorial is ever materialised.
fn poisson_pmf(lambda: f64, max_k: usize) -> Vec<f64> {
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_concentrates_on_nil() {
        let d = build_distribution(0.0, 0.0, MAX_GOALS).unwrap();
        assert_eq!(d.get(0), 1.0);
        assert!(d.probs()[1..].iter().all(|p| *p == 0.0));
        assert_eq!(d.tail_mass(), 0.0);
    }

    #[test]
    fn zero_grid_keeps_only_nil_slot() {
        let d = build_distribution(1.3, 0.2, 0).unwrap();
        assert_eq!(d.probs().len(), 1);
        assert!((d.get(0) - (0.2 + 0.8 * (-1.3_f64).exp())).abs() < 1e-12);
        assert!((d.get(0) + d.tail_mass() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn full_inflation_is_all_nil() {
        let d = build_distribution(2.4, 1.0, MAX_GOALS).unwrap();
        assert_eq!(d.get(0), 1.0);
        assert!(d.probs()[1..].iter().all(|p| *p == 0.0));
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        assert!(matches!(
            build_distribution(-0.1, 0.0, MAX_GOALS),
            Err(ModelError::InvalidParameter { field: "lambda", .. })
        ));
        assert!(matches!(
            build_distribution(1.0, 1.5, MAX_GOALS),
            Err(ModelError::InvalidParameter {
                field: "zero_inflation",
                ..
            })
        ));
        assert!(build_distribution(f64::NAN, 0.0, MAX_GOALS).is_err());
    }

    #[test]
    fn large_grid_stays_finite() {
        let d = build_distribution(9.0, 0.0, 60).unwrap();
        assert!(d.probs().iter().all(|p| p.is_finite() && *p >= 0.0));
        assert!(d.tail_mass() < 1e-9);
    }
}
