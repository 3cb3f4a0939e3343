use std::collections::HashSet;

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PvFinanceError;
use crate::types::{Capacity, Energy};
use crate::PvFinanceResult;

/// One installation site as delivered by the portfolio table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioObject {
    #[serde(rename = "Objekt")]
    pub id: String,
    /// Proposed capacity; absent means nothing is planned yet
    #[serde(rename = "Vorschlag_kWp", default)]
    pub capacity_kwp: Option<Capacity>,
    /// Annual on-site consumption
    #[serde(rename = "Verbrauch_kWh", default)]
    pub consumption_kwh: Option<Energy>,
}

impl PortfolioObject {
    pub fn new(id: impl Into<String>, capacity_kwp: Capacity, consumption_kwh: Energy) -> Self {
        Self {
            id: id.into(),
            capacity_kwp: Some(capacity_kwp),
            consumption_kwh: Some(consumption_kwh),
        }
    }

    /// Capacity with a missing value read as zero.
    pub fn capacity(&self) -> Capacity {
        self.capacity_kwp.unwrap_or(Decimal::ZERO)
    }

    /// Consumption with a missing value read as zero (no demand to serve).
    pub fn consumption(&self) -> Energy {
        self.consumption_kwh.unwrap_or(Decimal::ZERO)
    }
}

/// Sums over the selected objects shared by the snapshot and the projection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub object_count: usize,
    pub capacity_kwp: Capacity,
    pub consumption_kwh: Energy,
}

impl PortfolioTotals {
    pub fn from_objects(objects: &[PortfolioObject]) -> Self {
        Self {
            object_count: objects.len(),
            capacity_kwp: objects.iter().map(PortfolioObject::capacity).sum(),
            consumption_kwh: objects.iter().map(PortfolioObject::consumption).sum(),
        }
    }
}

/// Objects whose identifier is in `ids`, in portfolio order.
///
/// An empty selection means the whole portfolio. Identifiers that match no
/// object are reported in `warnings`.
pub fn select(
    objects: &[PortfolioObject],
    ids: &[String],
    warnings: &mut Vec<String>,
) -> Vec<PortfolioObject> {
    if ids.is_empty() {
        return objects.to_vec();
    }

    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let known: HashSet<&str> = objects.iter().map(|o| o.id.as_str()).collect();
    for id in ids {
        if !known.contains(id.as_str()) {
            warnings.push(format!("Selected object '{id}' is not in the portfolio"));
        }
    }

    objects
        .iter()
        .filter(|o| wanted.contains(o.id.as_str()))
        .cloned()
        .collect()
}

/// Record warnings for objects with missing fields that will be read as 0.
pub fn missing_field_warnings(objects: &[PortfolioObject], warnings: &mut Vec<String>) {
    for obj in objects {
        if obj.capacity_kwp.is_none() {
            warn!("Object '{}' has no proposed capacity, using 0 kWp", obj.id);
            warnings.push(format!(
                "Object '{}' has no proposed capacity; treated as 0 kWp",
                obj.id
            ));
        }
        if obj.consumption_kwh.is_none() {
            warn!("Object '{}' has no consumption, using 0 kWh", obj.id);
            warnings.push(format!(
                "Object '{}' has no consumption; treated as 0 kWh (all generation exported)",
                obj.id
            ));
        }
    }
}

/// Reject portfolios that break the record invariants: unique identifiers
/// and non-negative capacity/consumption.
pub fn validate_portfolio(objects: &[PortfolioObject]) -> PvFinanceResult<()> {
    let mut seen = HashSet::new();
    let mut capacity = Some(Decimal::ZERO);
    let mut consumption = Some(Decimal::ZERO);
    for obj in objects {
        if !seen.insert(obj.id.as_str()) {
            return Err(PvFinanceError::InvalidInput {
                field: "Objekt".into(),
                reason: format!("Duplicate object identifier '{}'", obj.id),
            });
        }
        if obj.capacity() < Decimal::ZERO {
            return Err(PvFinanceError::InvalidInput {
                field: "Vorschlag_kWp".into(),
                reason: format!("Capacity of '{}' cannot be negative", obj.id),
            });
        }
        if obj.consumption() < Decimal::ZERO {
            return Err(PvFinanceError::InvalidInput {
                field: "Verbrauch_kWh".into(),
                reason: format!("Consumption of '{}' cannot be negative", obj.id),
            });
        }
        capacity = capacity.and_then(|c| c.checked_add(obj.capacity()));
        consumption = consumption.and_then(|c| c.checked_add(obj.consumption()));
    }

    // Totals of any selection are bounded by the portfolio totals
    let overflowing = match (capacity, consumption) {
        (None, _) => Some("Vorschlag_kWp"),
        (_, None) => Some("Verbrauch_kWh"),
        _ => None,
    };
    if let Some(field) = overflowing {
        return Err(PvFinanceError::InvalidInput {
            field: field.into(),
            reason: "Portfolio total exceeds the decimal range".into(),
        });
    }
    Ok(())
}

/// Parse the portfolio table (`Objekt,Vorschlag_kWp,Verbrauch_kWh`, extra
/// columns ignored) and validate it.
#[cfg(feature = "csv")]
pub fn read_portfolio<R: std::io::Read>(reader: R) -> PvFinanceResult<Vec<PortfolioObject>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut objects = Vec::new();
    for record in rdr.deserialize() {
        let obj: PortfolioObject = record?;
        objects.push(obj);
    }

    validate_portfolio(&objects)?;
    Ok(objects)
}
