use std::io::Write;

use crate::error::PvFinanceError;
use crate::projection::YearRecord;
use crate::snapshot::SnapshotRow;
use crate::PvFinanceResult;

pub const CASH_FLOW_FILE_NAME: &str = "cashflows_portfolio.csv";

/// Write the projection as CSV: `Year,EBITDA,DebtService,CFADS,EquityCF,DSCR`,
/// one row per year, an undefined DSCR as an empty field.
pub fn write_cash_flows_csv<W: Write>(records: &[YearRecord], writer: W) -> PvFinanceResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() {
        wtr.write_record(["Year", "EBITDA", "DebtService", "CFADS", "EquityCF", "DSCR"])?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the year-1 per-object table as CSV.
pub fn write_snapshot_csv<W: Write>(rows: &[SnapshotRow], writer: W) -> PvFinanceResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        wtr.write_record([
            "Objekt",
            "kWp",
            "Verbrauch_kWh",
            "gen_y1",
            "sc_kWh",
            "exp_kWh",
            "rev_mieter",
            "rev_grid",
            "opex",
            "pacht",
            "fee",
            "ebitda",
        ])?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// The projection CSV as a string.
pub fn cash_flows_csv_string(records: &[YearRecord]) -> PvFinanceResult<String> {
    let mut buf = Vec::new();
    write_cash_flows_csv(records, &mut buf)?;
    String::from_utf8(buf).map_err(|e| PvFinanceError::SerializationError(e.to_string()))
}
