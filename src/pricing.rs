use serde::Serialize;

/// Probabilities at or below this have no price.
pub const PRICE_EPSILON: f64 = 0.0001;

/// Negative or non-finite margins become zero.
pub fn clamp_margin(margin_pct: f64) -> f64 {
    if margin_pct.is_finite() {
        margin_pct.max(0.0)
    } else {
        0.0
    }
}

/// Rescales a mutually exclusive set so it sums to `1 + margin_pct / 100`.
///
/// `margin_pct` must already be clamped at zero. A set summing to zero comes
/// back as zeros.
pub fn apply_margin(probs: &[f64], margin_pct: f64) -> Vec<f64> {
    let target_sum = 1.0 + margin_pct / 100.0;
    let current_sum: f64 = probs.iter().sum();
    if current_sum == 0.0 {
        return vec![0.0; probs.len()];
    }
    probs
        .iter()
        .map(|p| p / current_sum * target_sum)
        .collect()
}

/// Decimal odds, `None` when the outcome is too unlikely to quote.
pub fn price_of(prob: f64) -> Option<f64> {
    (prob > PRICE_EPSILON).then(|| 1.0 / prob)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedOutcome {
    pub label: String,
    pub probability: f64,
    pub margin_pct: f64,
    pub adjusted: f64,
    pub price: Option<f64>,
}

/// Prices a labelled, mutually exclusive set in one go.
pub fn price_set<L: Into<String>>(
    outcomes: impl IntoIterator<Item = (L, f64)>,
    margin_pct: f64,
) -> Vec<PricedOutcome> {
    let (labels, probs): (Vec<String>, Vec<f64>) = outcomes
        .into_iter()
        .map(|(label, p)| (label.into(), p))
        .unzip();
    let adjusted = apply_margin(&probs, margin_pct);

    labels
        .into_iter()
        .zip(probs)
        .zip(adjusted)
        .map(|((label, probability), adjusted)| PricedOutcome {
            label,
            probability,
            margin_pct,
            adjusted,
            price: price_of(adjusted),
        })
        .collect()
}
