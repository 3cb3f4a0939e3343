use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PvFinanceError;
use crate::types::{Money, Rate};
use crate::PvFinanceResult;

/// Techno-economic assumptions for one calculation run.
///
/// Every field falls back to the base-case value when it is missing from
/// the input, so a partial assumptions file overrides only what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumptions {
    /// Specific yield (kWh per kWp and year)
    pub specific_yield: Decimal,
    /// Share of generation consumed on site, capped by actual consumption
    pub self_consumption_quota: Rate,
    /// Tenant electricity price (EUR/kWh) earned on self-consumed energy
    pub tenant_price: Money,
    /// Feed-in price (EUR/kWh) earned on exported energy
    pub grid_price: Money,
    /// Billing fee (EUR/kWh) charged on self-consumed energy
    pub billing_fee: Money,
    /// CAPEX (EUR/kWp)
    pub capex_per_kwp: Money,
    /// OPEX (EUR/kWp/year)
    pub opex_per_kwp: Money,
    /// Roof lease (EUR/kWp/year)
    pub lease_per_kwp: Money,
    /// Annual generation decay (decimal, 0.005 = 0.5%/year)
    pub degradation: Rate,
    /// Annual escalation of prices and costs
    pub inflation: Rate,
    /// Analysis horizon in years
    pub horizon_years: u32,
    /// Share of CAPEX funded by equity; the rest is debt
    pub equity_quota: Rate,
    /// Annual interest rate on the debt
    pub debt_rate: Rate,
    /// Debt amortisation period in years
    pub debt_tenor_years: u32,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            specific_yield: dec!(930),
            self_consumption_quota: dec!(0.55),
            tenant_price: dec!(0.28),
            grid_price: dec!(0.08),
            billing_fee: dec!(0.02),
            capex_per_kwp: dec!(1000),
            opex_per_kwp: dec!(20),
            lease_per_kwp: dec!(10),
            degradation: dec!(0.005),
            inflation: dec!(0.02),
            horizon_years: 20,
            equity_quota: dec!(0.30),
            debt_rate: dec!(0.05),
            debt_tenor_years: 15,
        }
    }
}

impl Assumptions {
    /// Check the invariants the model relies on. Presentation bounds (e.g.
    /// yield between 700 and 1200) belong to the input surface, not here.
    pub fn validate(&self) -> PvFinanceResult<()> {
        check_unit_interval("self_consumption_quota", self.self_consumption_quota)?;
        check_unit_interval("equity_quota", self.equity_quota)?;

        let non_negative = [
            ("specific_yield", self.specific_yield),
            ("tenant_price", self.tenant_price),
            ("grid_price", self.grid_price),
            ("billing_fee", self.billing_fee),
            ("capex_per_kwp", self.capex_per_kwp),
            ("opex_per_kwp", self.opex_per_kwp),
            ("lease_per_kwp", self.lease_per_kwp),
            ("degradation", self.degradation),
            ("inflation", self.inflation),
            ("debt_rate", self.debt_rate),
        ];
        for (field, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(PvFinanceError::InvalidInput {
                    field: field.into(),
                    reason: format!("Must be non-negative, got {value}"),
                });
            }
        }

        if self.degradation >= Decimal::ONE {
            return Err(PvFinanceError::InvalidInput {
                field: "degradation".into(),
                reason: "Degradation must be below 100% per year".into(),
            });
        }
        if self.horizon_years < 1 {
            return Err(PvFinanceError::InvalidInput {
                field: "horizon_years".into(),
                reason: "Analysis horizon must be at least 1 year".into(),
            });
        }
        if self.debt_tenor_years < 1 {
            return Err(PvFinanceError::InvalidInput {
                field: "debt_tenor_years".into(),
                reason: "Debt tenor must be at least 1 year".into(),
            });
        }

        Ok(())
    }
}

fn check_unit_interval(field: &str, value: Rate) -> PvFinanceResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(PvFinanceError::InvalidInput {
            field: field.into(),
            reason: format!("Must be between 0 and 1, got {value}"),
        });
    }
    Ok(())
}
