use serde::{Deserialize, Serialize};

use crate::distribution::MAX_GOALS;
use crate::joint::DEFAULT_TAIL_WARN_THRESHOLD;
use crate::markets::STANDARD_LINES;
use crate::model::HalfSplit;
use crate::price_book::MarginPlan;
use crate::pricing::clamp_margin;

pub const DEFAULT_MARGIN_PCT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_goals: usize,
    pub tail_warn_threshold: f64,
    pub goal_lines: Vec<f64>,
    pub half_split: HalfSplit,
    pub margin: MarginPlan,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_goals: MAX_GOALS,
            tail_warn_threshold: DEFAULT_TAIL_WARN_THRESHOLD,
            goal_lines: STANDARD_LINES.to_vec(),
            half_split: HalfSplit::default(),
            margin: MarginPlan::Global(DEFAULT_MARGIN_PCT),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `XG_*` variables; `.env.local` and `.env` are read first.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let parse_f64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        let max_goals = lookup("XG_MAX_GOALS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(d.max_goals)
            .min(30);

        let tail_warn_threshold = parse_f64("XG_TAIL_WARN")
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(d.tail_warn_threshold);

        let goal_lines = lookup("XG_GOAL_LINES")
            .and_then(|raw| parse_lines(&raw))
            .unwrap_or(d.goal_lines);

        let share = parse_f64("XG_FIRST_HALF_SHARE").filter(|f| *f > 0.0 && *f < 1.0);
        let half_split = match lookup("XG_HALF_SPLIT").as_deref().map(str::trim) {
            Some("uniform") => HalfSplit::Uniform {
                factor: share.unwrap_or(0.5),
            },
            _ => match share {
                Some(first_half_share) => HalfSplit::Complementary { first_half_share },
                None => d.half_split,
            },
        };

        let margin = match (
            parse_f64("XG_MARGIN_FULL_PCT"),
            parse_f64("XG_MARGIN_HALF_PCT"),
        ) {
            (None, None) => MarginPlan::Global(clamp_margin(
                parse_f64("XG_MARGIN_PCT").unwrap_or(DEFAULT_MARGIN_PCT),
            )),
            (full, half) => {
                let full = clamp_margin(full.unwrap_or(DEFAULT_MARGIN_PCT));
                let half = clamp_margin(half.unwrap_or(full));
                MarginPlan::PerPeriod {
                    full_time: full,
                    first_half: half,
                    second_half: half,
                }
            }
        };

        Self {
            max_goals,
            tail_warn_threshold,
            goal_lines,
            half_split,
            margin,
        }
    }
}

// Only half-goal lines are accepted so that no push can occur.
fn parse_lines(raw: &str) -> Option<Vec<f64>> {
    let mut lines = Vec::new();
    for part in raw.split(',') {
        let line = part.trim().parse::<f64>().ok()?;
        if line < 0.0 || line.fract() != 0.5 {
            return None;
        }
        lines.push(line);
    }
    if lines.is_empty() {
        return None;
    }
    lines.sort_by(f64::total_cmp);
    lines.dedup();
    Some(lines)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cfg_from(pairs: &[(&str, &str)]) -> EngineConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(cfg_from(&[]), EngineConfig::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = cfg_from(&[
            ("XG_MAX_GOALS", "10"),
            ("XG_TAIL_WARN", "0.005"),
            ("XG_GOAL_LINES", "2.5, 0.5,1.5"),
            ("XG_FIRST_HALF_SHARE", "0.42"),
            ("XG_MARGIN_PCT", "7.5"),
        ]);
        assert_eq!(cfg.max_goals, 10);
        assert_eq!(cfg.tail_warn_threshold, 0.005);
        assert_eq!(cfg.goal_lines, vec![0.5, 1.5, 2.5]);
        assert_eq!(
            cfg.half_split,
            HalfSplit::Complementary {
                first_half_share: 0.42
            }
        );
        assert_eq!(cfg.margin, MarginPlan::Global(7.5));
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = cfg_from(&[
            ("XG_MAX_GOALS", "lots"),
            ("XG_GOAL_LINES", "2,3"),
            ("XG_FIRST_HALF_SHARE", "1.4"),
            ("XG_MARGIN_PCT", "-4"),
        ]);
        let d = EngineConfig::default();
        assert_eq!(cfg.max_goals, d.max_goals);
        assert_eq!(cfg.goal_lines, d.goal_lines);
        assert_eq!(cfg.half_split, d.half_split);
        assert_eq!(cfg.margin, MarginPlan::Global(0.0));
    }

    #[test]
    fn per_period_margins_and_uniform_split() {
        let cfg = cfg_from(&[
            ("XG_HALF_SPLIT", "uniform"),
            ("XG_MARGIN_FULL_PCT", "4"),
            ("XG_MARGIN_HALF_PCT", "8"),
        ]);
        assert_eq!(cfg.half_split, HalfSplit::Uniform { factor: 0.5 });
        assert_eq!(
            cfg.margin,
            MarginPlan::PerPeriod {
                full_time: 4.0,
                first_half: 8.0,
                second_half: 8.0,
            }
        );
    }
}
