use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use xg_markets::model::{HalfSplit, Period};
use xg_markets::pricing::PricedOutcome;
use xg_markets::{EngineConfig, MarginPlan, MatchInputs, MatchModel, PriceBook};

#[derive(Debug, Deserialize)]
struct MatchCase {
    #[serde(default)]
    home: Option<String>,
    #[serde(default)]
    away: Option<String>,
    inputs: MatchInputs,
    #[serde(default)]
    half_split: Option<HalfSplit>,
    #[serde(default)]
    margin: Option<MarginPlan>,
}

#[derive(Serialize)]
struct Output<'a> {
    model: &'a MatchModel,
    prices: &'a PriceBook,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut json = false;
    let mut path = None;
    let mut scores = Vec::new();
    for arg in std::env::args().skip(1) {
        if let Some(key) = arg.strip_prefix("--score=") {
            scores.push(key.to_string());
            continue;
        }
        match arg.as_str() {
            "--json" => json = true,
            _ => path = Some(PathBuf::from(arg)),
        }
    }
    let path = path.unwrap_or_else(|| PathBuf::from("tests/fixtures/match_case.json"));

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let case: MatchCase = serde_json::from_str(&raw).context("parse match case")?;
    case.inputs.validate().context("invalid match inputs")?;

    let mut cfg = EngineConfig::from_env();
    if let Some(split) = case.half_split {
        cfg.half_split = split;
    }
    if let Some(margin) = case.margin {
        cfg.margin = margin;
    }

    let model = MatchModel::build(&case.inputs, &cfg)?;
    let prices = PriceBook::price(&model, &cfg.margin);

    if json {
        let out = serde_json::to_string_pretty(&Output {
            model: &model,
            prices: &prices,
        })
        .context("serialize output")?;
        println!("{out}");
        return Ok(());
    }

    let home = case.home.as_deref().unwrap_or("Home");
    let away = case.away.as_deref().unwrap_or("Away");
    println!(
        "{home} v {away}  xG {:.2} - {:.2}",
        case.inputs.home_xg, case.inputs.away_xg
    );
    if !model.is_reliable() {
        println!(
            "warning: goal grid truncates over {:.1}% of mass",
            cfg.tail_warn_threshold * 100.0
        );
    }

    for period in [Period::FullTime, Period::FirstHalf, Period::SecondHalf] {
        let m = &model.period(period).markets;
        let book = prices.period(period);
        println!();
        println!("{period:?} (margin {:.1}%)", book.margin_pct);
        print_outcomes("1X2", &book.result);
        print_outcomes("BTTS", &book.btts);
        for line in &book.totals {
            print_outcomes(&format!("Goals {}", line.line), &line.outcomes);
        }
        println!(
            "  Most likely {}  Clean sheet {:.1}% / {:.1}%",
            m.most_likely,
            m.clean_sheet_home * 100.0,
            m.clean_sheet_away * 100.0
        );
    }

    for key in &scores {
        match prices.full_time.correct_score_price(key) {
            Some(o) => match o.price {
                Some(price) => println!("  Correct score {} {:.2}", o.label, price),
                None => println!("  Correct score {} -", o.label),
            },
            None => println!("  Correct score {key}: not on the grid"),
        }
    }

    println!();
    println!("Half-time / Full-time");
    print_outcomes("HT/FT", &prices.htft);

    let halves = &model.half_time_full_time.highest_scoring_half;
    println!(
        "  Highest scoring half: 1st {:.1}%  2nd {:.1}%  equal {:.1}%",
        halves.first * 100.0,
        halves.second * 100.0,
        halves.equal * 100.0
    );

    Ok(())
}

fn print_outcomes(title: &str, outcomes: &[PricedOutcome]) {
    let cells: Vec<String> = outcomes
        .iter()
        .map(|o| match o.price {
            Some(price) => format!("{} {:.2}", o.label, price),
            None => format!("{} -", o.label),
        })
        .collect();
    println!("  {title:<10} {}", cells.join("  "));
}
