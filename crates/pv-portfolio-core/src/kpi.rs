use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::projection::{equity_cash_flows, unlevered_cash_flows, FinancingStructure, YearRecord};
use crate::time_value::irr;
use crate::types::{Money, Multiple, Rate};

/// DSCR below which lenders typically start to worry.
const DSCR_COVENANT_THRESHOLD: Multiple = dec!(1.2);

/// Debt service coverage ratio; undefined without debt service or when the
/// ratio leaves the decimal range.
pub fn dscr(cfads: Money, debt_service: Money) -> Option<Multiple> {
    if debt_service > Decimal::ZERO {
        cfads.checked_div(debt_service)
    } else {
        None
    }
}

/// Minimum and average DSCR over the operating years.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DscrStats {
    pub min: Option<Multiple>,
    pub avg: Option<Multiple>,
}

impl DscrStats {
    /// Years 1..=horizon only; years without a defined DSCR are skipped.
    pub fn from_records(records: &[YearRecord]) -> Self {
        let values: Vec<Multiple> = records.iter().skip(1).filter_map(|r| r.dscr).collect();
        if values.is_empty() {
            return Self::default();
        }

        let sum = values
            .iter()
            .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v));
        Self {
            min: values.iter().copied().min(),
            avg: sum.map(|s| s / Decimal::from(values.len() as u64)),
        }
    }
}

/// Portfolio KPIs. `None` means "not available".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub capex: Money,
    pub unlevered_irr: Option<Rate>,
    pub levered_irr: Option<Rate>,
    pub dscr_min: Option<Multiple>,
    pub dscr_avg: Option<Multiple>,
}

/// Both IRRs and the DSCR statistics of a projection. IRR failures become
/// "not available" plus a warning, they never abort the run.
pub fn aggregate_kpis(
    records: &[YearRecord],
    financing: &FinancingStructure,
    warnings: &mut Vec<String>,
) -> KpiSummary {
    let unlevered = unlevered_cash_flows(records, financing.capex);
    let levered = equity_cash_flows(records);
    let stats = DscrStats::from_records(records);

    if let Some(min) = stats.min {
        if min < DSCR_COVENANT_THRESHOLD {
            warnings.push(format!(
                "Minimum DSCR of {} is below {DSCR_COVENANT_THRESHOLD}x: lender covenant risk",
                min.round_dp(2)
            ));
        }
    }

    KpiSummary {
        capex: financing.capex,
        unlevered_irr: solve_irr("Unlevered IRR", &unlevered, warnings),
        levered_irr: solve_irr("Equity IRR", &levered, warnings),
        dscr_min: stats.min,
        dscr_avg: stats.avg,
    }
}

fn solve_irr(label: &str, cash_flows: &[Money], warnings: &mut Vec<String>) -> Option<Rate> {
    // Every rate zeroes an all-zero series, so there is no meaningful IRR
    if cash_flows.iter().all(|cf| cf.is_zero()) {
        warnings.push(format!("{label} not available: no cash flows"));
        return None;
    }

    match irr(cash_flows) {
        Ok(rate) => Some(rate),
        Err(e) => {
            warn!("{label} not available: {e}");
            warnings.push(format!("{label} not available: {e}"));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

pub const NOT_AVAILABLE: &str = "n/a";

/// `0.1234` -> `12.34%`
pub fn format_pct(rate: Option<Rate>) -> String {
    match rate {
        Some(r) => format!("{:.2}%", (r * dec!(100)).round_dp(2)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `1.456` -> `1.46x`
pub fn format_multiple(value: Option<Multiple>) -> String {
    match value {
        Some(v) => format!("{:.2}x", v.round_dp(2)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `1234567.8` -> `1,234,568 €`
pub fn format_eur(amount: Money) -> String {
    let rounded = amount.round_dp(0).abs().to_string();
    let digits = rounded.split('.').next().unwrap_or("0");

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount.round_dp(0).is_sign_negative() && !amount.round_dp(0).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped} €")
}

impl KpiSummary {
    /// Label/value pairs in display order.
    pub fn display_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CAPEX", format_eur(self.capex)),
            ("Unlevered IRR", format_pct(self.unlevered_irr)),
            ("Equity IRR", format_pct(self.levered_irr)),
            ("DSCR min", format_multiple(self.dscr_min)),
            ("DSCR avg", format_multiple(self.dscr_avg)),
        ]
    }
}
