use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::error::PvFinanceError;
use crate::kpi::dscr;
use crate::portfolio::PortfolioTotals;
use crate::snapshot::self_consumption;
use crate::time_value::annuity;
use crate::types::{Money, Multiple};
use crate::PvFinanceResult;

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

/// Sources of funds for the portfolio and the resulting debt service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancingStructure {
    /// Total investment = total kWp * CAPEX/kWp
    pub capex: Money,
    pub debt: Money,
    pub equity: Money,
    /// Fixed annual annuity on the debt, paid in years 1..=tenor
    pub debt_service: Money,
}

impl FinancingStructure {
    pub fn new(totals: &PortfolioTotals, a: &Assumptions) -> PvFinanceResult<Self> {
        let capex = totals
            .capacity_kwp
            .checked_mul(a.capex_per_kwp)
            .ok_or_else(|| PvFinanceError::InvalidInput {
                field: "capex_per_kwp".into(),
                reason: format!(
                    "Investment of {} kWp at {} per kWp exceeds the decimal range",
                    totals.capacity_kwp, a.capex_per_kwp
                ),
            })?;
        // equity_quota is in [0, 1], so both shares are bounded by capex
        let debt = capex * (Decimal::ONE - a.equity_quota);
        let equity = capex * a.equity_quota;
        let debt_service = annuity(debt, a.debt_rate, a.debt_tenor_years)?;

        Ok(Self {
            capex,
            debt,
            equity,
            debt_service,
        })
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// One year of the portfolio cash-flow projection. Year 0 is the
/// investment year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "EBITDA")]
    pub ebitda: Money,
    #[serde(rename = "DebtService")]
    pub debt_service: Money,
    /// Cash flow available for debt service (= EBITDA, taxes are zero)
    #[serde(rename = "CFADS")]
    pub cfads: Money,
    #[serde(rename = "EquityCF")]
    pub equity_cf: Money,
    /// None in years without debt service
    #[serde(rename = "DSCR")]
    pub dscr: Option<Multiple>,
}

impl YearRecord {
    fn investment(equity: Money) -> Self {
        Self {
            year: 0,
            ebitda: Decimal::ZERO,
            debt_service: Decimal::ZERO,
            cfads: Decimal::ZERO,
            equity_cf: -equity,
            dscr: None,
        }
    }
}

/// Build the year-by-year projection for years 0..=horizon.
///
/// Generation degrades from year 2 on; prices and costs escalate with
/// inflation from year 2 on. Consumption is a fixed ceiling on
/// self-consumption for the whole horizon. Debt service stops after the
/// tenor even if the horizon runs longer.
///
/// Fails with `InvalidInput` on `horizon_years` once escalated figures
/// leave the decimal range.
pub fn project_cash_flows(
    totals: &PortfolioTotals,
    a: &Assumptions,
    financing: &FinancingStructure,
) -> PvFinanceResult<Vec<YearRecord>> {
    let mut records = Vec::with_capacity(a.horizon_years as usize + 1);
    records.push(YearRecord::investment(financing.equity));

    let base_generation = totals.capacity_kwp * a.specific_yield;
    let mut degradation_factor = Decimal::ONE;
    let mut escalation = Some(Decimal::ONE);

    for year in 1..=a.horizon_years {
        if year > 1 {
            degradation_factor *= Decimal::ONE - a.degradation;
            escalation = escalation.and_then(|e| e.checked_mul(Decimal::ONE + a.inflation));
        }

        let generation = base_generation * degradation_factor;
        let record = escalation
            .and_then(|e| project_year(year, generation, e, totals, a, financing))
            .ok_or_else(|| PvFinanceError::InvalidInput {
                field: "horizon_years".into(),
                reason: format!(
                    "Projected figures exceed the decimal range in year {year} of {}",
                    a.horizon_years
                ),
            })?;
        records.push(record);
    }

    debug!(
        "Projected {} years: capex {}, debt service {} for {} years",
        a.horizon_years, financing.capex, financing.debt_service, a.debt_tenor_years
    );
    Ok(records)
}

/// One operating year, or `None` when a figure overflows.
fn project_year(
    year: u32,
    generation: Decimal,
    escalation: Decimal,
    totals: &PortfolioTotals,
    a: &Assumptions,
    financing: &FinancingStructure,
) -> Option<YearRecord> {
    let escalated = |v: Decimal| v.checked_mul(escalation);

    let self_consumed =
        self_consumption(generation, a.self_consumption_quota, totals.consumption_kwh);
    let exported = generation - self_consumed;

    let revenue = self_consumed
        .checked_mul(escalated(a.tenant_price)?)?
        .checked_add(exported.checked_mul(escalated(a.grid_price)?)?)?;
    let opex = totals.capacity_kwp.checked_mul(escalated(a.opex_per_kwp)?)?;
    let lease = totals.capacity_kwp.checked_mul(escalated(a.lease_per_kwp)?)?;
    let fee = self_consumed.checked_mul(escalated(a.billing_fee)?)?;

    let ebitda = revenue.checked_sub(opex)?.checked_sub(lease)?.checked_sub(fee)?;
    // Taxes are zero in this model
    let cfads = ebitda;
    let debt_service = if year <= a.debt_tenor_years {
        financing.debt_service
    } else {
        Decimal::ZERO
    };

    Some(YearRecord {
        year,
        ebitda,
        debt_service,
        cfads,
        equity_cf: cfads.checked_sub(debt_service)?,
        dscr: dscr(cfads, debt_service),
    })
}

/// Unlevered project cash flows: -CAPEX at t = 0, then EBITDA.
pub fn unlevered_cash_flows(records: &[YearRecord], capex: Money) -> Vec<Money> {
    std::iter::once(-capex)
        .chain(records.iter().skip(1).map(|r| r.ebitda))
        .collect()
}

/// Levered equity cash flows: -equity at t = 0, then CFADS less debt service.
pub fn equity_cash_flows(records: &[YearRecord]) -> Vec<Money> {
    records.iter().map(|r| r.equity_cf).collect()
}
