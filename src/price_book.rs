use serde::{Deserialize, Serialize};

use crate::compound::{DoubleChance, HtFtTable};
use crate::joint::Scoreline;
use crate::markets::Outcome;
use crate::model::{MatchModel, Period, PeriodModel};
use crate::pricing::{PricedOutcome, apply_margin, clamp_margin, price_of, price_set};

/// Which margin applies to which period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginPlan {
    Global(f64),
    PerPeriod {
        full_time: f64,
        first_half: f64,
        second_half: f64,
    },
}

impl MarginPlan {
    pub fn margin_for(&self, period: Period) -> f64 {
        let m = match *self {
            MarginPlan::Global(m) => m,
            MarginPlan::PerPeriod {
                full_time,
                first_half,
                second_half,
            } => match period {
                Period::FullTime => full_time,
                Period::FirstHalf => first_half,
                Period::SecondHalf => second_half,
            },
        };
        clamp_margin(m)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBook {
    pub line: f64,
    pub outcomes: Vec<PricedOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBook {
    pub period: Period,
    pub margin_pct: f64,
    pub result: Vec<PricedOutcome>,
    pub btts: Vec<PricedOutcome>,
    pub totals: Vec<LineBook>,
    pub exact_totals: Vec<PricedOutcome>,
    pub clean_sheet: Vec<PricedOutcome>,
    pub win_to_nil: Vec<PricedOutcome>,
    pub correct_score: Vec<PricedOutcome>,
}

impl PeriodBook {
    fn price(model: &PeriodModel, margin_pct: f64) -> Self {
        let m = &model.markets;

        let result = price_set(
            Outcome::ALL.map(|o| (o.code(), m.result.get(o))),
            margin_pct,
        );
        let btts = price_set([("Yes", m.btts_yes), ("No", m.btts_no)], margin_pct);
        let totals = m
            .totals
            .iter()
            .map(|t| LineBook {
                line: t.line,
                outcomes: price_set(
                    [
                        (format!("Over {}", t.line), t.over),
                        (format!("Under {}", t.line), t.under),
                    ],
                    margin_pct,
                ),
            })
            .collect();
        let exact_totals = price_set(
            m.exact_totals
                .iter()
                .enumerate()
                .map(|(goals, p)| (format!("{goals} goals"), *p)),
            margin_pct,
        );
        let clean_sheet = vec![
            price_against_field("Home clean sheet", m.clean_sheet_home, margin_pct),
            price_against_field("Away clean sheet", m.clean_sheet_away, margin_pct),
        ];
        let win_to_nil = vec![
            price_against_field("Home win to nil", m.win_to_nil_home, margin_pct),
            price_against_field("Away win to nil", m.win_to_nil_away, margin_pct),
        ];
        let correct_score = price_set(
            m.correct_scores().map(|(s, p)| (s.to_string(), p)),
            margin_pct,
        );

        Self {
            period: model.period,
            margin_pct,
            result,
            btts,
            totals,
            exact_totals,
            clean_sheet,
            win_to_nil,
            correct_score,
        }
    }

    /// Looks up a correct-score price by its "h-a" key.
    pub fn correct_score_price(&self, key: &str) -> Option<&PricedOutcome> {
        let label = Scoreline::parse(key)?.to_string();
        self.correct_score.iter().find(|o| o.label == label)
    }
}

// Yes side of a yes/no market whose "no" is `1 - p`.
fn price_against_field(label: &str, prob: f64, margin_pct: f64) -> PricedOutcome {
    let adjusted = apply_margin(&[prob, 1.0 - prob], margin_pct)[0];
    PricedOutcome {
        label: label.to_string(),
        probability: prob,
        margin_pct,
        adjusted,
        price: price_of(adjusted),
    }
}

fn double_chance_legs(dc: &DoubleChance, side: &str, line: f64) -> [(String, f64); 3] {
    [
        (format!("1X & {side} {line}"), dc.home_or_draw),
        (format!("X2 & {side} {line}"), dc.draw_or_away),
        (format!("12 & {side} {line}"), dc.home_or_away),
    ]
}

/// Prices for every market of a built model.
///
/// Re-pricing only reads the model, so a margin change never rebuilds a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBook {
    pub full_time: PeriodBook,
    pub first_half: PeriodBook,
    pub second_half: PeriodBook,
    pub htft: Vec<PricedOutcome>,
    pub htft_goals: Vec<LineBook>,
    pub result_goals: Vec<LineBook>,
    /// Legs overlap, so each is priced against its own complement.
    pub double_chance_goals: Vec<LineBook>,
}

impl PriceBook {
    pub fn price(model: &MatchModel, plan: &MarginPlan) -> Self {
        let ft_margin = plan.margin_for(Period::FullTime);

        let htft = price_set(
            model
                .half_time_full_time
                .htft
                .iter()
                .map(|(ht, ft, p)| (HtFtTable::key(ht, ft), p)),
            ft_margin,
        );

        let htft_goals = model
            .half_time_full_time
            .htft_goals
            .iter()
            .map(|row| {
                let over = row.over.iter().map(|(ht, ft, p)| {
                    (format!("{} & Over {}", HtFtTable::key(ht, ft), row.line), p)
                });
                let under = row.under.iter().map(|(ht, ft, p)| {
                    (format!("{} & Under {}", HtFtTable::key(ht, ft), row.line), p)
                });
                LineBook {
                    line: row.line,
                    outcomes: price_set(over.chain(under), ft_margin),
                }
            })
            .collect();

        let double_chance_goals = model
            .double_chance_goals
            .iter()
            .map(|row| {
                let legs = double_chance_legs(&row.over, "Over", row.line)
                    .into_iter()
                    .chain(double_chance_legs(&row.under, "Under", row.line));
                LineBook {
                    line: row.line,
                    outcomes: legs
                        .map(|(label, p)| price_against_field(&label, p, ft_margin))
                        .collect(),
                }
            })
            .collect();

        let result_goals = model
            .result_goals
            .iter()
            .map(|row| {
                let over = Outcome::ALL
                    .map(|o| (format!("{} & Over {}", o.code(), row.line), row.over.get(o)));
                let under = Outcome::ALL
                    .map(|o| (format!("{} & Under {}", o.code(), row.line), row.under.get(o)));
                LineBook {
                    line: row.line,
                    outcomes: price_set(over.into_iter().chain(under), ft_margin),
                }
            })
            .collect();

        Self {
            full_time: PeriodBook::price(&model.full_time, ft_margin),
            first_half: PeriodBook::price(&model.first_half, plan.margin_for(Period::FirstHalf)),
            second_half: PeriodBook::price(
                &model.second_half,
                plan.margin_for(Period::SecondHalf),
            ),
            htft,
            htft_goals,
            result_goals,
            double_chance_goals,
        }
    }

    pub fn period(&self, period: Period) -> &PeriodBook {
        match period {
            Period::FullTime => &self.full_time,
            Period::FirstHalf => &self.first_half,
            Period::SecondHalf => &self.second_half,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::MatchInputs;

    fn model() -> MatchModel {
        MatchModel::build(&MatchInputs::new(1.5, 1.2), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn per_period_plan_routes_margins() {
        let plan = MarginPlan::PerPeriod {
            full_time: 4.0,
            first_half: 6.0,
            second_half: -2.0,
        };
        assert_eq!(plan.margin_for(Period::FullTime), 4.0);
        assert_eq!(plan.margin_for(Period::FirstHalf), 6.0);
        assert_eq!(plan.margin_for(Period::SecondHalf), 0.0);
    }

    fn sum(v: &[PricedOutcome]) -> f64 {
        v.iter().map(|o| o.adjusted).sum()
    }

    #[test]
    fn book_sums_match_the_overround() {
        let book = PriceBook::price(&model(), &MarginPlan::Global(8.0));
        assert!((sum(&book.full_time.result) - 1.08).abs() < 1e-9);
        assert!((sum(&book.full_time.btts) - 1.08).abs() < 1e-9);
        assert!((sum(&book.htft) - 1.08).abs() < 1e-9);
        assert!((sum(&book.full_time.correct_score) - 1.08).abs() < 1e-9);
        assert_eq!(book.htft.len(), 9);
        assert_eq!(book.htft[1].label, "1/X");
        assert_eq!(book.result_goals[2].outcomes.len(), 6);
        assert_eq!(book.htft_goals[2].outcomes.len(), 18);
        assert!((sum(&book.htft_goals[2].outcomes) - 1.08).abs() < 1e-9);
        assert!((sum(&book.full_time.exact_totals) - 1.08).abs() < 1e-9);
    }

    #[test]
    fn overlapping_legs_carry_the_margin_individually() {
        let m = model();
        let book = PriceBook::price(&m, &MarginPlan::Global(10.0));
        let leg = &book.double_chance_goals[2].outcomes[0];
        assert_eq!(leg.label, "1X & Over 2.5");
        let p = m.double_chance_goals[2].over.home_or_draw;
        assert!((leg.adjusted - p * 1.10).abs() < 1e-12);
        assert_eq!(book.double_chance_goals[2].outcomes.len(), 6);

        let cs = &book.full_time.clean_sheet[0];
        assert!((cs.adjusted - m.full_time.markets.clean_sheet_home * 1.10).abs() < 1e-12);
        let wtn = &book.full_time.win_to_nil[1];
        assert_eq!(wtn.probability, m.full_time.markets.win_to_nil_away);
    }

    #[test]
    fn correct_score_lookup_accepts_loose_keys() {
        let m = model();
        let book = PriceBook::price(&m, &MarginPlan::Global(0.0));
        let hit = book.full_time.correct_score_price(" 2 - 1 ").expect("2-1 priced");
        assert_eq!(hit.label, "2-1");
        assert_eq!(hit.probability, m.full_time.joint.get(2, 1));
        assert!(book.full_time.correct_score_price("9-0").is_none());
        assert!(book.full_time.correct_score_price("2:1").is_none());
    }

    #[test]
    fn zero_margin_prices_are_fair() {
        let m = model();
        let book = PriceBook::price(&m, &MarginPlan::Global(0.0));
        let home = &book.full_time.result[0];
        assert_eq!(home.label, "1");
        assert!((home.adjusted - m.full_time.markets.result.home).abs() < 1e-12);
        assert!((home.price.unwrap() * m.full_time.markets.result.home - 1.0).abs() < 1e-9);
    }
}
