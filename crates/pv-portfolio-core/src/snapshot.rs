use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::error::PvFinanceError;
use crate::portfolio::{PortfolioObject, PortfolioTotals};
use crate::types::{Capacity, Energy, Money};
use crate::PvFinanceResult;

/// Undiscounted first-year economics of one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    #[serde(rename = "Objekt")]
    pub id: String,
    #[serde(rename = "kWp")]
    pub capacity_kwp: Capacity,
    #[serde(rename = "Verbrauch_kWh")]
    pub consumption_kwh: Energy,
    #[serde(rename = "gen_y1")]
    pub generation_kwh: Energy,
    #[serde(rename = "sc_kWh")]
    pub self_consumed_kwh: Energy,
    #[serde(rename = "exp_kWh")]
    pub exported_kwh: Energy,
    #[serde(rename = "rev_mieter")]
    pub tenant_revenue: Money,
    #[serde(rename = "rev_grid")]
    pub grid_revenue: Money,
    pub opex: Money,
    #[serde(rename = "pacht")]
    pub lease: Money,
    pub fee: Money,
    pub ebitda: Money,
}

/// Year-1 view of the selected objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Year1Snapshot {
    pub rows: Vec<SnapshotRow>,
    pub totals: PortfolioTotals,
    pub self_consumed_mwh: Energy,
    pub exported_mwh: Energy,
    pub ebitda: Money,
}

/// On-site share of `generation`: the quota applied to generation, but
/// never more than the site actually consumes.
pub fn self_consumption(generation: Energy, quota: Decimal, consumption: Energy) -> Energy {
    (generation * quota).min(consumption)
}

/// Year-1 economics of one object. No escalation or degradation applies.
pub fn snapshot_row(obj: &PortfolioObject, a: &Assumptions) -> PvFinanceResult<SnapshotRow> {
    row_figures(obj, a).ok_or_else(|| PvFinanceError::InvalidInput {
        field: "Vorschlag_kWp".into(),
        reason: format!("Year-1 figures of '{}' exceed the decimal range", obj.id),
    })
}

fn row_figures(obj: &PortfolioObject, a: &Assumptions) -> Option<SnapshotRow> {
    let capacity = obj.capacity();
    let consumption = obj.consumption();

    let generation = capacity.checked_mul(a.specific_yield)?;
    let self_consumed = self_consumption(generation, a.self_consumption_quota, consumption);
    let exported = generation - self_consumed;

    let tenant_revenue = self_consumed.checked_mul(a.tenant_price)?;
    let grid_revenue = exported.checked_mul(a.grid_price)?;
    let opex = capacity.checked_mul(a.opex_per_kwp)?;
    let lease = capacity.checked_mul(a.lease_per_kwp)?;
    let fee = self_consumed.checked_mul(a.billing_fee)?;
    let ebitda = tenant_revenue
        .checked_add(grid_revenue)?
        .checked_sub(opex)?
        .checked_sub(lease)?
        .checked_sub(fee)?;

    Some(SnapshotRow {
        id: obj.id.clone(),
        capacity_kwp: capacity,
        consumption_kwh: consumption,
        generation_kwh: generation,
        self_consumed_kwh: self_consumed,
        exported_kwh: exported,
        tenant_revenue,
        grid_revenue,
        opex,
        lease,
        fee,
        ebitda,
    })
}

fn checked_total(
    rows: &[SnapshotRow],
    field: impl Fn(&SnapshotRow) -> Decimal,
) -> PvFinanceResult<Decimal> {
    rows.iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(field(r)))
        .ok_or_else(|| PvFinanceError::InvalidInput {
            field: "Vorschlag_kWp".into(),
            reason: "Portfolio year-1 totals exceed the decimal range".into(),
        })
}

pub fn year1_snapshot(
    objects: &[PortfolioObject],
    a: &Assumptions,
) -> PvFinanceResult<Year1Snapshot> {
    let rows = objects
        .iter()
        .map(|o| snapshot_row(o, a))
        .collect::<PvFinanceResult<Vec<SnapshotRow>>>()?;

    let self_consumed = checked_total(&rows, |r| r.self_consumed_kwh)?;
    let exported = checked_total(&rows, |r| r.exported_kwh)?;
    let ebitda = checked_total(&rows, |r| r.ebitda)?;

    Ok(Year1Snapshot {
        rows,
        totals: PortfolioTotals::from_objects(objects),
        self_consumed_mwh: self_consumed / dec!(1000),
        exported_mwh: exported / dec!(1000),
        ebitda,
    })
}
