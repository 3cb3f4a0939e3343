use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use pv_portfolio_core::kpi::format_pct;
use pv_portfolio_core::time_value::{self, IrrSettings};

/// Arguments for a stand-alone IRR calculation
#[derive(Args)]
pub struct IrrArgs {
    /// Periodic cash flows starting at t = 0 (comma-separated, e.g. "-100,30,30,60")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,

    /// Initial guess for the solver
    #[arg(long)]
    pub guess: Option<Decimal>,

    /// Maximum number of Newton-Raphson iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

/// Arguments for the annuity payment
#[derive(Args)]
pub struct AnnuityArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Interest rate per period (e.g. 0.05)
    #[arg(long)]
    pub rate: Decimal,

    /// Number of periods
    #[arg(long)]
    pub periods: u32,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let defaults = IrrSettings::default();
    let settings = IrrSettings {
        guess: args.guess.unwrap_or(defaults.guess),
        max_iterations: args.max_iterations.unwrap_or(defaults.max_iterations),
        ..defaults
    };

    let rate = time_value::irr_with(&args.cash_flows, &settings)?;
    Ok(json!({
        "result": {
            "irr": rate.round_dp(10).to_string(),
            "irr_pct": format_pct(Some(rate)),
        }
    }))
}

pub fn run_annuity(args: AnnuityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payment = time_value::annuity(args.principal, args.rate, args.periods)?;
    let total_paid = payment
        .checked_mul(Decimal::from(args.periods))
        .ok_or("Total of all payments exceeds the decimal range")?;
    let total_interest = total_paid
        .checked_sub(args.principal)
        .ok_or("Total interest exceeds the decimal range")?;
    Ok(json!({
        "result": {
            "payment": payment.round_dp(2).to_string(),
            "total_paid": total_paid.round_dp(2).to_string(),
            "total_interest": total_interest.round_dp(2).to_string(),
        }
    }))
}
