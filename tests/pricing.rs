use xg_markets::pricing::{PRICE_EPSILON, apply_margin, clamp_margin, price_of};

#[test]
fn zero_margin_on_unit_set_is_identity() {
    let probs = [0.45, 0.3, 0.25];
    assert_eq!(apply_margin(&probs, 0.0), probs.to_vec());
}

#[test]
fn zero_margin_renormalises_a_short_set() {
    let out = apply_margin(&[0.4, 0.4], 0.0);
    assert!((out[0] - 0.5).abs() < 1e-12);
}

#[test]
fn output_sum_hits_the_overround() {
    for margin in [0.0, 2.5, 5.0, 12.0, 30.0] {
        let out = apply_margin(&[0.12, 0.33, 0.07, 0.41], margin);
        let sum: f64 = out.iter().sum();
        assert!((sum - (1.0 + margin / 100.0)).abs() < 1e-9);
    }
}

#[test]
fn scenario_ten_percent() {
    let out = apply_margin(&[0.5, 0.3, 0.2], 10.0);
    assert!((out.iter().sum::<f64>() - 1.10).abs() < 1e-9);
    assert!((out[0] - 0.55).abs() < 1e-9);
}

#[test]
fn negative_margin_is_clamped_by_caller_helper() {
    let out = apply_margin(&[0.6, 0.4], clamp_margin(-5.0));
    assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-12);
}

#[test]
fn tiny_probabilities_have_no_price() {
    assert_eq!(price_of(PRICE_EPSILON / 2.0), None);
    assert_eq!(price_of(0.25), Some(4.0));
}
