use pv_portfolio_core::time_value::{annuity, irr, irr_with, npv, IrrFailure, IrrSettings};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Annuity
// ===========================================================================

#[test]
fn test_annuity_zero_rate_splits_evenly() {
    for n in 1..=25u32 {
        let payment = annuity(dec!(120000), Decimal::ZERO, n).unwrap();
        assert_eq!(payment, dec!(120000) / Decimal::from(n));
    }
}

#[test]
fn test_annuity_zero_term_any_rate() {
    for rate in [Decimal::ZERO, dec!(0.01), dec!(0.05), dec!(0.15)] {
        assert_eq!(annuity(dec!(70000), rate, 0).unwrap(), Decimal::ZERO);
    }
}

#[test]
fn test_annuity_payment_discounts_back_to_principal() {
    let principal = dec!(250000);
    let rate = dec!(0.045);
    let payment = annuity(principal, rate, 20).unwrap();

    let mut flows = vec![-principal];
    flows.extend(std::iter::repeat(payment).take(20));
    assert!(npv(rate, &flows).unwrap().abs() < dec!(0.0001));
}

#[test]
fn test_annuity_higher_rate_costs_more() {
    let low = annuity(dec!(70000), dec!(0.03), 15).unwrap();
    let high = annuity(dec!(70000), dec!(0.07), 15).unwrap();
    assert!(high > low);
    assert!(low > dec!(70000) / dec!(15));
}

#[test]
fn test_annuity_long_term_approaches_interest_only() {
    // Beyond the decimal range of (1 + r)^n the payment is principal * rate
    let payment = annuity(dec!(70000), dec!(1), 100).unwrap();
    assert_eq!(payment, dec!(70000));

    let long = annuity(dec!(70000), dec!(0.05), 1000).unwrap();
    assert!(long > dec!(3500));
    assert!(long - dec!(3500) < dec!(0.000001));
}

// ===========================================================================
// IRR
// ===========================================================================

#[test]
fn test_irr_ten_percent() {
    let rate = irr(&[dec!(-100), dec!(110)]).unwrap();
    assert!((rate - dec!(0.10)).abs() < dec!(0.000001));
}

#[test]
fn test_irr_known_answer_even_cashflows() {
    // -1000, +400, +400, +400 => IRR ~9.7%
    let rate = irr(&[dec!(-1000), dec!(400), dec!(400), dec!(400)]).unwrap();
    assert!(
        (rate - dec!(0.097)).abs() < dec!(0.001),
        "Expected IRR ~9.7%, got {}",
        rate
    );
}

#[test]
fn test_irr_high_return() {
    // -100 invest, +300 back in 3 years => IRR ~44%
    let rate = irr(&[dec!(-100), dec!(0), dec!(0), dec!(300)]).unwrap();
    assert!(
        rate > dec!(0.40) && rate < dec!(0.50),
        "Expected IRR ~44%, got {}",
        rate
    );
}

#[test]
fn test_irr_all_positive_fails() {
    let result = irr(&[dec!(100), dec!(100)]);
    assert!(
        matches!(
            result,
            Err(IrrFailure::MaxIterationsExhausted { iterations: 100, .. })
                | Err(IrrFailure::ZeroDerivativeStall { iterations: 100, .. })
        ),
        "Expected failure after 100 iterations, got {result:?}"
    );
}

#[test]
fn test_irr_iteration_cap_respected() {
    // A slow start with a single iteration cannot converge
    let settings = IrrSettings {
        max_iterations: 1,
        ..Default::default()
    };
    let result = irr_with(&[dec!(-1000), dec!(100), dec!(100), dec!(1500)], &settings);
    assert!(matches!(
        result,
        Err(IrrFailure::MaxIterationsExhausted { iterations: 1, last_npv: Some(_) })
    ));
}

#[test]
fn test_irr_failure_message_is_readable() {
    let err = irr(&[dec!(-100), Decimal::ZERO]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("zero derivative") || msg.contains("did not converge"), "{msg}");
}
