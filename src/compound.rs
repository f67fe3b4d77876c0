use serde::Serialize;

use crate::error::{ModelError, Result};
use crate::joint::{JointMatrix, Scoreline};
use crate::markets::{Outcome, Prob3, STANDARD_LINES, classify_outcome};

/// Half-time result x full-time result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HtFtTable {
    cells: [[f64; 3]; 3],
}

impl HtFtTable {
    pub fn get(&self, half_time: Outcome, full_time: Outcome) -> f64 {
        self.cells[half_time.index()][full_time.index()]
    }

    fn add(&mut self, half_time: Outcome, full_time: Outcome, p: f64) {
        self.cells[half_time.index()][full_time.index()] += p;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, Outcome, f64)> + '_ {
        Outcome::ALL.into_iter().flat_map(move |ht| {
            Outcome::ALL
                .into_iter()
                .map(move |ft| (ht, ft, self.get(ht, ft)))
        })
    }

    pub fn key(half_time: Outcome, full_time: Outcome) -> String {
        format!("{}/{}", half_time.code(), full_time.code())
    }

    pub fn sum(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HtFtGoalLine {
    pub line: f64,
    pub over: HtFtTable,
    pub under: HtFtTable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HalfComparison {
    pub first: f64,
    pub second: f64,
    pub equal: f64,
}

/// Markets that need both half-period matrices at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HalfTimeFullTime {
    pub htft: HtFtTable,
    pub htft_goals: Vec<HtFtGoalLine>,
    pub highest_scoring_half: HalfComparison,
    pub win_both_halves_home: f64,
    pub win_both_halves_away: f64,
}

pub fn derive_half_time_full_time(
    first_half: &JointMatrix,
    second_half: &JointMatrix,
) -> Result<HalfTimeFullTime> {
    derive_half_time_full_time_with_lines(first_half, second_half, &STANDARD_LINES)
}

/// Visits every pair of half scorelines, `(G+1)^4` cells.
///
/// The halves are taken as independent, so a pair's probability is the
/// product of its two cells and the full-time score is their sum.
pub fn derive_half_time_full_time_with_lines(
    first_half: &JointMatrix,
    second_half: &JointMatrix,
    lines: &[f64],
) -> Result<HalfTimeFullTime> {
    if first_half.side() != second_half.side() {
        return Err(ModelError::GridMismatch {
            home: first_half.side(),
            away: second_half.side(),
        });
    }

    let mut htft = HtFtTable::default();
    let mut over = vec![HtFtTable::default(); lines.len()];
    let mut under = vec![HtFtTable::default(); lines.len()];
    let mut halves = HalfComparison::default();
    let mut win_both_home = 0.0;
    let mut win_both_away = 0.0;

    for (s1, p1) in first_half.iter() {
        if p1 == 0.0 {
            continue;
        }
        let ht = classify_outcome(s1.home, s1.away);

        for (s2, p2) in second_half.iter() {
            let p = p1 * p2;
            if p == 0.0 {
                continue;
            }
            let ft_home = s1.home + s2.home;
            let ft_away = s1.away + s2.away;
            let ft = classify_outcome(ft_home, ft_away);
            htft.add(ht, ft, p);

            let total = (ft_home + ft_away) as f64;
            for (i, line) in lines.iter().enumerate() {
                if total > *line {
                    over[i].add(ht, ft, p);
                } else {
                    under[i].add(ht, ft, p);
                }
            }

            match s1.total().cmp(&s2.total()) {
                std::cmp::Ordering::Greater => halves.first += p,
                std::cmp::Ordering::Less => halves.second += p,
                std::cmp::Ordering::Equal => halves.equal += p,
            }

            let h2 = classify_outcome(s2.home, s2.away);
            if ht == Outcome::Home && h2 == Outcome::Home {
                win_both_home += p;
            } else if ht == Outcome::Away && h2 == Outcome::Away {
                win_both_away += p;
            }
        }
    }

    let htft_goals = lines
        .iter()
        .zip(over.into_iter().zip(under))
        .map(|(line, (over, under))| HtFtGoalLine {
            line: *line,
            over,
            under,
        })
        .collect();

    Ok(HalfTimeFullTime {
        htft,
        htft_goals,
        highest_scoring_half: halves,
        win_both_halves_home: win_both_home,
        win_both_halves_away: win_both_away,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreProb {
    pub score: Scoreline,
    pub prob: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalBucket {
    pub total: usize,
    /// Most likely first; equal probabilities keep grid order.
    pub scores: Vec<ScoreProb>,
}

pub fn derive_final_score_by_goals(joint: &JointMatrix) -> Vec<GoalBucket> {
    let mut buckets: Vec<GoalBucket> = (0..2 * joint.side() - 1)
        .map(|total| GoalBucket {
            total,
            scores: Vec::new(),
        })
        .collect();

    for (score, prob) in joint.iter() {
        buckets[score.total()].scores.push(ScoreProb { score, prob });
    }
    for bucket in &mut buckets {
        // sort_by is stable.
        bucket.scores.sort_by(|a, b| b.prob.total_cmp(&a.prob));
    }
    buckets
}

/// A cell can land in two of the three buckets: a draw counts for 1X and X2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DoubleChance {
    pub home_or_draw: f64,
    pub draw_or_away: f64,
    pub home_or_away: f64,
}

impl DoubleChance {
    fn add(&mut self, outcome: Outcome, p: f64) {
        match outcome {
            Outcome::Home => {
                self.home_or_draw += p;
                self.home_or_away += p;
            }
            Outcome::Draw => {
                self.home_or_draw += p;
                self.draw_or_away += p;
            }
            Outcome::Away => {
                self.draw_or_away += p;
                self.home_or_away += p;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoubleChanceGoalLine {
    pub line: f64,
    pub over: DoubleChance,
    pub under: DoubleChance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultGoalLine {
    pub line: f64,
    pub over: Prob3,
    pub under: Prob3,
}

pub fn derive_double_chance_goals(joint: &JointMatrix, lines: &[f64]) -> Vec<DoubleChanceGoalLine> {
    let mut out: Vec<DoubleChanceGoalLine> = lines
        .iter()
        .map(|line| DoubleChanceGoalLine {
            line: *line,
            over: DoubleChance::default(),
            under: DoubleChance::default(),
        })
        .collect();

    for (score, p) in joint.iter() {
        let outcome = classify_outcome(score.home, score.away);
        let total = score.total() as f64;
        for row in &mut out {
            if total > row.line {
                row.over.add(outcome, p);
            } else {
                row.under.add(outcome, p);
            }
        }
    }
    out
}

/// Raw grid sums, no 1X2 renormalisation.
pub fn derive_result_goals(joint: &JointMatrix, lines: &[f64]) -> Vec<ResultGoalLine> {
    let mut out: Vec<ResultGoalLine> = lines
        .iter()
        .map(|line| ResultGoalLine {
            line: *line,
            over: Prob3::default(),
            under: Prob3::default(),
        })
        .collect();

    for (score, p) in joint.iter() {
        let outcome = classify_outcome(score.home, score.away);
        let total = score.total() as f64;
        for row in &mut out {
            if total > row.line {
                row.over.add(outcome, p);
            } else {
                row.under.add(outcome, p);
            }
        }
    }
    out
}
