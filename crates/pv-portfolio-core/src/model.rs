use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::kpi::{aggregate_kpis, KpiSummary};
use crate::portfolio::{missing_field_warnings, select, validate_portfolio, PortfolioObject};
use crate::projection::{project_cash_flows, FinancingStructure, YearRecord};
use crate::snapshot::{year1_snapshot, Year1Snapshot};
use crate::types::{with_metadata, ComputationOutput};
use crate::PvFinanceResult;

/// Everything a run produces: year-1 view, projection and KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioModelOutput {
    pub snapshot: Year1Snapshot,
    pub financing: FinancingStructure,
    pub projection: Vec<YearRecord>,
    pub kpis: KpiSummary,
}

/// Run the full portfolio model.
///
/// `selection` lists object identifiers to include; empty means all. The
/// function holds no state, callers re-run it whenever an input changes.
pub fn compute(
    portfolio: &[PortfolioObject],
    selection: &[String],
    assumptions: &Assumptions,
) -> PvFinanceResult<ComputationOutput<PortfolioModelOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    assumptions.validate()?;
    validate_portfolio(portfolio)?;

    let objects = select(portfolio, selection, &mut warnings);
    missing_field_warnings(&objects, &mut warnings);
    if objects.is_empty() {
        warnings.push("No portfolio objects selected; all figures are zero".into());
    }

    let snapshot = year1_snapshot(&objects, assumptions)?;
    let totals = snapshot.totals;
    debug!(
        "Selected {} objects: {} kWp, {} kWh consumption",
        totals.object_count, totals.capacity_kwp, totals.consumption_kwh
    );

    let financing = FinancingStructure::new(&totals, assumptions)?;
    let projection = project_cash_flows(&totals, assumptions, &financing)?;

    if assumptions.debt_tenor_years > assumptions.horizon_years && !financing.debt.is_zero() {
        warnings.push(format!(
            "Debt tenor ({} years) exceeds the analysis horizon ({} years); debt is not fully repaid within the projection",
            assumptions.debt_tenor_years, assumptions.horizon_years
        ));
    }

    let kpis = aggregate_kpis(&projection, &financing, &mut warnings);

    let output = PortfolioModelOutput {
        snapshot,
        financing,
        projection,
        kpis,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PV portfolio cash-flow model (annuity debt, zero tax)",
        assumptions,
        warnings,
        elapsed,
        output,
    ))
}
