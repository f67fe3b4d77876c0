use serde::{Deserialize, Serialize};

use crate::joint::{JointMatrix, Scoreline};

/// Half-goal lines priced for every totals-style market.
pub const STANDARD_LINES: [f64; 6] = [0.5, 1.5, 2.5, 3.5, 4.5, 5.5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    pub fn index(self) -> usize {
        match self {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 2,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Outcome::Home => "1",
            Outcome::Draw => "X",
            Outcome::Away => "2",
        }
    }
}

pub fn classify_outcome(home_goals: usize, away_goals: usize) -> Outcome {
    if home_goals > away_goals {
        Outcome::Home
    } else if home_goals < away_goals {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Prob3 {
    pub fn uniform() -> Self {
        Self {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }

    pub(crate) fn add(&mut self, outcome: Outcome, p: f64) {
        match outcome {
            Outcome::Home => self.home += p,
            Outcome::Draw => self.draw += p,
            Outcome::Away => self.away += p,
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.home, self.draw, self.away]
    }

    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum > 0.0 {
            Self {
                home: self.home / sum,
                draw: self.draw / sum,
                away: self.away / sum,
            }
        } else {
            Self::uniform()
        }
    }
}

/// Over/under split at a half-goal line. `under` is `1 - over`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalLine {
    pub line: f64,
    pub over: f64,
    pub under: f64,
}

/// Every single-period market drawn from one joint matrix.
///
/// `result` is renormalised over the grid so that 1X2 sums to one; all other
/// figures are raw grid sums and their complements are taken as `1 - p`, which
/// leaves the truncated tail on the complement side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSet {
    pub result: Prob3,
    pub result_raw: Prob3,
    pub draw_no_bet_home: f64,
    pub draw_no_bet_away: f64,
    pub btts_yes: f64,
    pub btts_no: f64,
    pub win_to_nil_home: f64,
    pub win_to_nil_away: f64,
    pub clean_sheet_home: f64,
    pub clean_sheet_away: f64,
    pub totals: Vec<TotalLine>,
    pub home_goals: Vec<TotalLine>,
    pub away_goals: Vec<TotalLine>,
    pub exact_totals: Vec<f64>,
    pub expected_home_goals: f64,
    pub expected_away_goals: f64,
    pub most_likely: Scoreline,
    side: usize,
    correct_score: Vec<f64>,
}

impl MarketSet {
    pub fn correct_score(&self, score: Scoreline) -> Option<f64> {
        if score.home >= self.side || score.away >= self.side {
            return None;
        }
        self.correct_score.get(score.home * self.side + score.away).copied()
    }

    pub fn correct_scores(&self) -> impl Iterator<Item = (Scoreline, f64)> + '_ {
        let side = self.side;
        self.correct_score
            .iter()
            .enumerate()
            .map(move |(idx, p)| (Scoreline::new(idx / side, idx % side), *p))
    }

    pub fn total_line(&self, line: f64) -> Option<&TotalLine> {
        self.totals.iter().find(|t| t.line == line)
    }

    pub fn exact_total(&self, goals: usize) -> f64 {
        self.exact_totals.get(goals).copied().unwrap_or(0.0)
    }
}

pub fn derive_markets(joint: &JointMatrix) -> MarketSet {
    derive_markets_with_lines(joint, &STANDARD_LINES)
}

/// One pass over the grid; every market comes from the same snapshot.
pub fn derive_markets_with_lines(joint: &JointMatrix, lines: &[f64]) -> MarketSet {
    let side = joint.side();
    let mut raw = Prob3::default();
    let mut btts_yes = 0.0;
    let mut win_to_nil_home = 0.0;
    let mut win_to_nil_away = 0.0;
    let mut clean_sheet_home = 0.0;
    let mut clean_sheet_away = 0.0;
    let mut over = vec![0.0; lines.len()];
    let mut home_over = vec![0.0; lines.len()];
    let mut away_over = vec![0.0; lines.len()];
    let mut exact_totals = vec![0.0; 2 * side - 1];
    let mut expected_home_goals = 0.0;
    let mut expected_away_goals = 0.0;
    let mut most_likely = (Scoreline::new(0, 0), f64::NEG_INFINITY);
    let mut correct_score = Vec::with_capacity(side * side);

    for (score, p) in joint.iter() {
        let (h, a) = (score.home, score.away);
        correct_score.push(p);
        raw.add(classify_outcome(h, a), p);

        if h > 0 && a > 0 {
            btts_yes += p;
        }
        if a == 0 {
            clean_sheet_home += p;
            if h > 0 {
                win_to_nil_home += p;
            }
        }
        if h == 0 {
            clean_sheet_away += p;
            if a > 0 {
                win_to_nil_away += p;
            }
        }

        let total = h + a;
        exact_totals[total] += p;
        for (i, line) in lines.iter().enumerate() {
            if total as f64 > *line {
                over[i] += p;
            }
            if h as f64 > *line {
                home_over[i] += p;
            }
            if a as f64 > *line {
                away_over[i] += p;
            }
        }

        expected_home_goals += h as f64 * p;
        expected_away_goals += a as f64 * p;
        if p > most_likely.1 {
            most_likely = (score, p);
        }
    }

    let result = raw.normalized();
    let decisive = result.home + result.away;
    let (draw_no_bet_home, draw_no_bet_away) = if decisive > 0.0 {
        (result.home / decisive, result.away / decisive)
    } else {
        (0.5, 0.5)
    };

    MarketSet {
        result,
        result_raw: raw,
        draw_no_bet_home,
        draw_no_bet_away,
        btts_yes,
        btts_no: 1.0 - btts_yes,
        win_to_nil_home,
        win_to_nil_away,
        clean_sheet_home,
        clean_sheet_away,
        totals: to_lines(lines, &over),
        home_goals: to_lines(lines, &home_over),
        away_goals: to_lines(lines, &away_over),
        exact_totals,
        expected_home_goals,
        expected_away_goals,
        most_likely: most_likely.0,
        side,
        correct_score,
    }
}

fn to_lines(lines: &[f64], over: &[f64]) -> Vec<TotalLine> {
    lines
        .iter()
        .zip(over)
        .map(|(line, over)| TotalLine {
            line: *line,
            over: *over,
            under: 1.0 - over,
        })
        .collect()
}
