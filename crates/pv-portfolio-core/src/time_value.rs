use log::{debug, trace, warn};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PvFinanceError;
use crate::types::{Money, Rate};
use crate::PvFinanceResult;

pub const DEFAULT_IRR_GUESS: Rate = dec!(0.10);
pub const IRR_TOLERANCE: Decimal = dec!(0.000001);
pub const MAX_IRR_ITERATIONS: u32 = 100;

/// Newton-Raphson parameters for [`irr_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrSettings {
    pub guess: Rate,
    /// The solver stops once |NPV(rate)| falls below this value
    pub tolerance: Decimal,
    pub max_iterations: u32,
}

impl Default for IrrSettings {
    fn default() -> Self {
        Self {
            guess: DEFAULT_IRR_GUESS,
            tolerance: IRR_TOLERANCE,
            max_iterations: MAX_IRR_ITERATIONS,
        }
    }
}

/// Why the IRR solver could not produce a rate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrrFailure {
    #[error("IRR requires at least 2 cash flows, got {0}")]
    InsufficientData(usize),

    #[error("IRR did not converge after {iterations} iterations (last NPV: {})", display_npv(.last_npv))]
    MaxIterationsExhausted {
        iterations: u32,
        last_npv: Option<Money>,
    },

    #[error("IRR stalled on a zero derivative after {iterations} iterations (last NPV: {})", display_npv(.last_npv))]
    ZeroDerivativeStall {
        iterations: u32,
        last_npv: Option<Money>,
    },
}

fn display_npv(npv: &Option<Money>) -> String {
    npv.map_or_else(|| "undefined".to_string(), |v| v.round_dp(6).to_string())
}

impl From<IrrFailure> for PvFinanceError {
    fn from(e: IrrFailure) -> Self {
        match e {
            IrrFailure::InsufficientData(n) => PvFinanceError::InsufficientData(format!(
                "IRR requires at least 2 cash flows, got {n}"
            )),
            IrrFailure::MaxIterationsExhausted {
                iterations,
                last_npv,
            }
            | IrrFailure::ZeroDerivativeStall {
                iterations,
                last_npv,
            } => PvFinanceError::ConvergenceFailure {
                function: "IRR".into(),
                iterations,
                last_delta: last_npv.unwrap_or(Decimal::MAX),
            },
        }
    }
}

/// Net Present Value of a series of cash flows, the first one at t = 0
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PvFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(PvFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(PvFinanceError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson with the default guess (10%),
/// tolerance (1e-6) and iteration cap (100).
pub fn irr(cash_flows: &[Money]) -> Result<Rate, IrrFailure> {
    irr_with(cash_flows, &IrrSettings::default())
}

/// Internal Rate of Return using Newton-Raphson on `NPV(r) = Σ c_t / (1+r)^t`.
///
/// An iteration whose step cannot be formed (zero derivative, or a value
/// outside the decimal range) holds the rate where it is. The solver never
/// clamps the rate, so a sequence without a sign change drifts until the
/// derivative vanishes and the iteration budget runs out.
pub fn irr_with(cash_flows: &[Money], settings: &IrrSettings) -> Result<Rate, IrrFailure> {
    if cash_flows.len() < 2 {
        return Err(IrrFailure::InsufficientData(cash_flows.len()));
    }

    let mut rate = settings.guess;
    let mut last_npv = None;
    let mut stalled = false;

    for i in 0..settings.max_iterations {
        let evaluated = npv_and_derivative(rate, cash_flows);

        if let Some((npv_val, _)) = evaluated {
            if npv_val.abs() < settings.tolerance {
                trace!("IRR converged to {rate} after {i} iterations");
                return Ok(rate);
            }
            last_npv = Some(npv_val);
        }

        let next = evaluated
            .filter(|(_, dnpv)| !dnpv.is_zero())
            .and_then(|(npv_val, dnpv)| npv_val.checked_div(dnpv))
            .and_then(|step| rate.checked_sub(step));

        match next {
            Some(r) => {
                rate = r;
                stalled = false;
            }
            None => stalled = true,
        }
        trace!("IRR iteration {i}: rate = {rate}, npv = {last_npv:?}");
    }

    let failure = if stalled {
        IrrFailure::ZeroDerivativeStall {
            iterations: settings.max_iterations,
            last_npv,
        }
    } else {
        IrrFailure::MaxIterationsExhausted {
            iterations: settings.max_iterations,
            last_npv,
        }
    };
    warn!("{failure}");
    Err(failure)
}

/// NPV and dNPV/dr at `rate`, or `None` when the NPV itself is not
/// representable (e.g. rate = -100%).
///
/// Once the discount factor leaves the decimal range the remaining terms
/// are treated as zero, which is where they are heading.
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r.is_zero() {
        return None;
    }

    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Some(Decimal::ONE);

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.and_then(|d| d.checked_mul(one_plus_r));
        }
        let Some(d) = discount else { break };

        npv_val = npv_val.checked_add(cf.checked_div(d)?)?;
        if t > 0 {
            if let Some(d_next) = d.checked_mul(one_plus_r) {
                let t_dec = Decimal::from(t as u64);
                dnpv = dnpv.checked_sub(t_dec.checked_mul(*cf)?.checked_div(d_next)?)?;
            }
        }
    }

    Some((npv_val, dnpv))
}

/// Constant periodic payment that fully amortises `principal` over
/// `periods` at `rate` per period.
///
/// Zero periods yields no payment; a zero rate repays in equal instalments.
/// When (1 + rate)^periods leaves the decimal range the payment is its
/// limit, `principal * rate`.
pub fn annuity(principal: Money, rate: Rate, periods: u32) -> PvFinanceResult<Money> {
    if periods == 0 {
        return Ok(Decimal::ZERO);
    }
    if rate <= dec!(-1) {
        return Err(PvFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Interest rate must be greater than -100%".into(),
        });
    }
    let n = Decimal::from(periods);
    if rate.is_zero() {
        return Ok(principal / n);
    }

    let out_of_range = || PvFinanceError::InvalidInput {
        field: "principal".into(),
        reason: format!("Annuity on {principal} at {rate} exceeds the decimal range"),
    };

    let factor = Decimal::ONE
        .checked_add(rate)
        .and_then(|base| base.checked_powu(u64::from(periods)));
    let Some(factor) = factor else {
        debug!("(1 + {rate})^{periods} out of range, using the perpetuity payment");
        return principal.checked_mul(rate).ok_or_else(out_of_range);
    };
    if factor == Decimal::ONE {
        // rate too small to register in (1 + rate)^n
        return Ok(principal / n);
    }

    factor
        .checked_div(factor - Decimal::ONE)
        .and_then(|ratio| principal.checked_mul(rate)?.checked_mul(ratio))
        .ok_or_else(out_of_range)
}
