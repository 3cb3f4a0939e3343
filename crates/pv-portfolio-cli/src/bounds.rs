use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use pv_portfolio_core::Assumptions;

/// Input range, default and step of one assumption as offered to the user.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Bound {
    pub option: &'static str,
    pub unit: &'static str,
    pub min: Decimal,
    pub max: Decimal,
    pub default: Decimal,
    pub step: Decimal,
}

/// Degradation and inflation are entered in percent.
pub const BOUNDS: [Bound; 14] = [
    bound("specific_yield", "kWh/kWp·a", dec!(700), dec!(1200), dec!(930), dec!(10)),
    bound("self_consumption_quota", "-", dec!(0), dec!(0.95), dec!(0.55), dec!(0.01)),
    bound("tenant_price", "€/kWh", dec!(0.10), dec!(0.60), dec!(0.28), dec!(0.01)),
    bound("grid_price", "€/kWh", dec!(0), dec!(0.30), dec!(0.08), dec!(0.01)),
    bound("billing_fee", "€/kWh", dec!(0), dec!(0.10), dec!(0.02), dec!(0.005)),
    bound("capex_per_kwp", "€/kWp", dec!(400), dec!(2000), dec!(1000), dec!(10)),
    bound("opex_per_kwp", "€/kWp·a", dec!(0), dec!(80), dec!(20), dec!(1)),
    bound("lease_per_kwp", "€/kWp·a", dec!(0), dec!(50), dec!(10), dec!(1)),
    bound("degradation", "%/a", dec!(0), dec!(2), dec!(0.5), dec!(0.1)),
    bound("inflation", "%/a", dec!(0), dec!(5), dec!(2), dec!(0.1)),
    bound("horizon_years", "years", dec!(5), dec!(30), dec!(20), dec!(1)),
    bound("equity_quota", "-", dec!(0), dec!(1), dec!(0.30), dec!(0.05)),
    bound("debt_rate", "p.a.", dec!(0), dec!(0.15), dec!(0.05), dec!(0.005)),
    bound("debt_tenor_years", "years", dec!(1), dec!(25), dec!(15), dec!(1)),
];

const fn bound(
    option: &'static str,
    unit: &'static str,
    min: Decimal,
    max: Decimal,
    default: Decimal,
    step: Decimal,
) -> Bound {
    Bound {
        option,
        unit,
        min,
        max,
        default,
        step,
    }
}

/// Values of `a` in the units the bounds are expressed in.
pub fn input_values(a: &Assumptions) -> [(&'static str, Decimal); 14] {
    [
        ("specific_yield", a.specific_yield),
        ("self_consumption_quota", a.self_consumption_quota),
        ("tenant_price", a.tenant_price),
        ("grid_price", a.grid_price),
        ("billing_fee", a.billing_fee),
        ("capex_per_kwp", a.capex_per_kwp),
        ("opex_per_kwp", a.opex_per_kwp),
        ("lease_per_kwp", a.lease_per_kwp),
        ("degradation", a.degradation * dec!(100)),
        ("inflation", a.inflation * dec!(100)),
        ("horizon_years", Decimal::from(a.horizon_years)),
        ("equity_quota", a.equity_quota),
        ("debt_rate", a.debt_rate),
        ("debt_tenor_years", Decimal::from(a.debt_tenor_years)),
    ]
}

/// Reject assumptions outside the offered input ranges.
pub fn check_bounds(a: &Assumptions) -> Result<(), String> {
    for (bound, (option, value)) in BOUNDS.iter().zip(input_values(a)) {
        debug_assert_eq!(bound.option, option);
        if value < bound.min || value > bound.max {
            return Err(format!(
                "{option} = {value} {} is outside the allowed range [{}, {}]",
                bound.unit, bound.min, bound.max
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_core_defaults() {
        let defaults = input_values(&Assumptions::default());
        for (bound, (option, value)) in BOUNDS.iter().zip(defaults) {
            assert_eq!(bound.option, option);
            assert_eq!(bound.default, value, "default of {option}");
        }
    }

    #[test]
    fn test_defaults_within_bounds() {
        assert!(check_bounds(&Assumptions::default()).is_ok());
    }

    #[test]
    fn test_yield_bounds() {
        let mut a = Assumptions::default();
        a.specific_yield = dec!(650);
        let err = check_bounds(&a).unwrap_err();
        assert!(err.contains("specific_yield"));

        a.specific_yield = dec!(700);
        assert!(check_bounds(&a).is_ok());
        a.specific_yield = dec!(1200);
        assert!(check_bounds(&a).is_ok());
        a.specific_yield = dec!(1200.5);
        assert!(check_bounds(&a).is_err());
    }

    #[test]
    fn test_degradation_checked_in_percent() {
        let mut a = Assumptions::default();
        a.degradation = dec!(0.02);
        assert!(check_bounds(&a).is_ok());
        a.degradation = dec!(0.021);
        assert!(check_bounds(&a).is_err());
    }

    #[test]
    fn test_short_horizon_rejected() {
        let mut a = Assumptions::default();
        a.horizon_years = 4;
        assert!(check_bounds(&a).is_err());
    }
}
