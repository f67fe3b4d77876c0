use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compound::{
    self, DoubleChanceGoalLine, GoalBucket, HalfTimeFullTime, ResultGoalLine,
};
use crate::config::EngineConfig;
use crate::distribution::{self, GoalDistribution, ScoringParameters};
use crate::error::{ModelError, Result};
use crate::joint::{self, JointMatrix};
use crate::markets::{self, MarketSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    FullTime,
    FirstHalf,
    SecondHalf,
}

/// How full-match expected goals are shared between the halves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HalfSplit {
    /// First half gets `f`, second half `1 - f`.
    Complementary { first_half_share: f64 },
    /// Both halves get `f`.
    Uniform { factor: f64 },
}

impl Default for HalfSplit {
    fn default() -> Self {
        HalfSplit::Complementary {
            first_half_share: 0.45,
        }
    }
}

impl HalfSplit {
    pub fn factors(&self) -> Result<(f64, f64)> {
        let f = match *self {
            HalfSplit::Complementary { first_half_share } => first_half_share,
            HalfSplit::Uniform { factor } => factor,
        };
        if !f.is_finite() || f <= 0.0 || f >= 1.0 {
            return Err(ModelError::invalid("half split", f, "must lie in (0, 1)"));
        }
        Ok(match self {
            HalfSplit::Complementary { .. } => (f, 1.0 - f),
            HalfSplit::Uniform { .. } => (f, f),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodParams {
    pub home: ScoringParameters,
    pub away: ScoringParameters,
}

impl PeriodParams {
    pub fn validate(&self) -> Result<()> {
        self.home.validate()?;
        self.away.validate()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            home: self.home.scaled(factor),
            away: self.away.scaled(factor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchInputs {
    pub home_xg: f64,
    pub away_xg: f64,
    #[serde(default)]
    pub home_zero_inflation: f64,
    #[serde(default)]
    pub away_zero_inflation: f64,
}

impl MatchInputs {
    pub fn new(home_xg: f64, away_xg: f64) -> Self {
        Self {
            home_xg,
            away_xg,
            home_zero_inflation: 0.0,
            away_zero_inflation: 0.0,
        }
    }

    pub fn with_zero_inflation(mut self, home: f64, away: f64) -> Self {
        self.home_zero_inflation = home;
        self.away_zero_inflation = away;
        self
    }

    /// Caller-side checks; also refuses a match nobody is expected to score in.
    pub fn validate(&self) -> Result<()> {
        self.full_time().validate()?;
        let aggregate = self.home_xg + self.away_xg;
        if aggregate <= 0.0 {
            return Err(ModelError::invalid(
                "aggregate xg",
                aggregate,
                "total expected goals must be positive",
            ));
        }
        Ok(())
    }

    pub fn full_time(&self) -> PeriodParams {
        PeriodParams {
            home: ScoringParameters {
                lambda: self.home_xg,
                zero_inflation: self.home_zero_inflation,
            },
            away: ScoringParameters {
                lambda: self.away_xg,
                zero_inflation: self.away_zero_inflation,
            },
        }
    }

    /// Zero inflation carries over to each half unchanged.
    pub fn halves(&self, split: HalfSplit) -> Result<(PeriodParams, PeriodParams)> {
        let (f1, f2) = split.factors()?;
        let full = self.full_time();
        Ok((full.scaled(f1), full.scaled(f2)))
    }
}

/// One engine run: distributions, joint grid and markets for a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodModel {
    pub period: Period,
    pub params: PeriodParams,
    pub home: GoalDistribution,
    pub away: GoalDistribution,
    pub joint: JointMatrix,
    pub markets: MarketSet,
}

impl PeriodModel {
    pub fn build(period: Period, params: PeriodParams, cfg: &EngineConfig) -> Result<Self> {
        params.validate()?;
        let home = distribution::build_from_params(&params.home, cfg.max_goals);
        let away = distribution::build_from_params(&params.away, cfg.max_goals);
        let joint = joint::build_joint_with_threshold(&home, &away, cfg.tail_warn_threshold)?;
        let markets = markets::derive_markets_with_lines(&joint, &cfg.goal_lines);
        Ok(Self {
            period,
            params,
            home,
            away,
            joint,
            markets,
        })
    }
}

/// Everything one calculation cycle produces. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchModel {
    pub inputs: MatchInputs,
    pub full_time: PeriodModel,
    pub first_half: PeriodModel,
    pub second_half: PeriodModel,
    pub half_time_full_time: HalfTimeFullTime,
    pub final_score_by_goals: Vec<GoalBucket>,
    pub double_chance_goals: Vec<DoubleChanceGoalLine>,
    pub result_goals: Vec<ResultGoalLine>,
}

impl MatchModel {
    pub fn build(inputs: &MatchInputs, cfg: &EngineConfig) -> Result<Self> {
        let (first, second) = inputs.halves(cfg.half_split)?;
        let full_time = PeriodModel::build(Period::FullTime, inputs.full_time(), cfg)?;
        let first_half = PeriodModel::build(Period::FirstHalf, first, cfg)?;
        let second_half = PeriodModel::build(Period::SecondHalf, second, cfg)?;

        let half_time_full_time = compound::derive_half_time_full_time_with_lines(
            &first_half.joint,
            &second_half.joint,
            &cfg.goal_lines,
        )?;
        let final_score_by_goals = compound::derive_final_score_by_goals(&full_time.joint);
        let double_chance_goals =
            compound::derive_double_chance_goals(&full_time.joint, &cfg.goal_lines);
        let result_goals = compound::derive_result_goals(&full_time.joint, &cfg.goal_lines);

        debug!(
            home_xg = inputs.home_xg,
            away_xg = inputs.away_xg,
            home = full_time.markets.result.home,
            draw = full_time.markets.result.draw,
            away = full_time.markets.result.away,
            tail = full_time.joint.tail_mass(),
            "match model built"
        );

        Ok(Self {
            inputs: *inputs,
            full_time,
            first_half,
            second_half,
            half_time_full_time,
            final_score_by_goals,
            double_chance_goals,
            result_goals,
        })
    }

    pub fn period(&self, period: Period) -> &PeriodModel {
        match period {
            Period::FullTime => &self.full_time,
            Period::FirstHalf => &self.first_half,
            Period::SecondHalf => &self.second_half,
        }
    }

    pub fn is_reliable(&self) -> bool {
        [&self.full_time, &self.first_half, &self.second_half]
            .iter()
            .all(|p| p.joint.is_reliable())
    }
}

/// Builds independent matches in parallel; results keep input order.
pub fn build_many(inputs: &[MatchInputs], cfg: &EngineConfig) -> Vec<Result<MatchModel>> {
    inputs
        .par_iter()
        .map(|i| MatchModel::build(i, cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complementary_split_shares_the_rate() {
        let inputs = MatchInputs::new(1.6, 1.2).with_zero_inflation(0.1, 0.0);
        let (h1, h2) = inputs
            .halves(HalfSplit::Complementary {
                first_half_share: 0.4,
            })
            .unwrap();
        assert!((h1.home.lambda - 0.64).abs() < 1e-12);
        assert!((h2.home.lambda - 0.96).abs() < 1e-12);
        assert_eq!(h1.home.zero_inflation, 0.1);
        assert_eq!(h2.home.zero_inflation, 0.1);
    }

    #[test]
    fn uniform_split_uses_one_factor_for_both_halves() {
        let inputs = MatchInputs::new(2.0, 1.0);
        let (h1, h2) = inputs.halves(HalfSplit::Uniform { factor: 0.5 }).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.home.lambda, 1.0);
    }

    #[test]
    fn split_factor_must_be_inside_unit_interval() {
        let inputs = MatchInputs::new(1.0, 1.0);
        for f in [0.0, 1.0, -0.2, f64::NAN] {
            assert!(inputs.halves(HalfSplit::Uniform { factor: f }).is_err());
        }
    }

    #[test]
    fn validate_rejects_goalless_expectancy() {
        assert!(MatchInputs::new(0.0, 0.0).validate().is_err());
        assert!(MatchInputs::new(-1.0, 2.0).validate().is_err());
        assert!(
            MatchInputs::new(1.0, 1.0)
                .with_zero_inflation(0.0, 1.2)
                .validate()
                .is_err()
        );
        assert!(MatchInputs::new(0.0, 0.8).validate().is_ok());
    }

    #[test]
    fn build_many_keeps_order_and_isolates_failures() {
        let cfg = EngineConfig::default();
        let inputs = [
            MatchInputs::new(1.5, 1.2),
            MatchInputs::new(-1.0, 1.0),
            MatchInputs::new(0.8, 2.1),
        ];
        let out = build_many(&inputs, &cfg);
        assert_eq!(out.len(), 3);
        assert!(out[1].is_err());
        assert_eq!(out[2].as_ref().unwrap().inputs.away_xg, 2.1);
    }
}
