use clap::Args;
use log::{info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::fs::File;

use pv_portfolio_core::export::{write_cash_flows_csv, write_snapshot_csv, CASH_FLOW_FILE_NAME};
use pv_portfolio_core::{compute, Assumptions, PortfolioModelOutput, PortfolioObject};
use pv_portfolio_core::types::ComputationOutput;

use crate::bounds::{check_bounds, input_values, BOUNDS};
use crate::input;

/// Individual assumption overrides; applied on top of the assumptions file.
#[derive(Args, Default)]
#[command(allow_hyphen_values = true)]
pub struct AssumptionOverrides {
    /// Specific yield (kWh/kWp per year)
    #[arg(long = "yield")]
    pub specific_yield: Option<Decimal>,

    /// Self-consumption quota (e.g. 0.55)
    #[arg(long)]
    pub sc_quota: Option<Decimal>,

    /// Tenant electricity price (€/kWh)
    #[arg(long)]
    pub tenant_price: Option<Decimal>,

    /// Grid feed-in price (€/kWh)
    #[arg(long)]
    pub grid_price: Option<Decimal>,

    /// Billing fee (€/kWh)
    #[arg(long)]
    pub billing_fee: Option<Decimal>,

    /// CAPEX (€/kWp)
    #[arg(long)]
    pub capex: Option<Decimal>,

    /// OPEX (€/kWp per year)
    #[arg(long)]
    pub opex: Option<Decimal>,

    /// Roof lease (€/kWp per year)
    #[arg(long)]
    pub lease: Option<Decimal>,

    /// Degradation in percent per year (e.g. 0.5)
    #[arg(long)]
    pub degradation_pct: Option<Decimal>,

    /// Inflation in percent per year (e.g. 2.0)
    #[arg(long)]
    pub inflation_pct: Option<Decimal>,

    /// Analysis horizon in years
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Equity quota (e.g. 0.30)
    #[arg(long)]
    pub equity_quota: Option<Decimal>,

    /// Debt interest rate per year (e.g. 0.05)
    #[arg(long)]
    pub debt_rate: Option<Decimal>,

    /// Debt tenor in years
    #[arg(long)]
    pub tenor: Option<u32>,
}

impl AssumptionOverrides {
    pub fn apply(&self, a: &mut Assumptions) {
        let pct = dec!(100);
        if let Some(v) = self.specific_yield {
            a.specific_yield = v;
        }
        if let Some(v) = self.sc_quota {
            a.self_consumption_quota = v;
        }
        if let Some(v) = self.tenant_price {
            a.tenant_price = v;
        }
        if let Some(v) = self.grid_price {
            a.grid_price = v;
        }
        if let Some(v) = self.billing_fee {
            a.billing_fee = v;
        }
        if let Some(v) = self.capex {
            a.capex_per_kwp = v;
        }
        if let Some(v) = self.opex {
            a.opex_per_kwp = v;
        }
        if let Some(v) = self.lease {
            a.lease_per_kwp = v;
        }
        if let Some(v) = self.degradation_pct {
            a.degradation = v / pct;
        }
        if let Some(v) = self.inflation_pct {
            a.inflation = v / pct;
        }
        if let Some(v) = self.horizon {
            a.horizon_years = v;
        }
        if let Some(v) = self.equity_quota {
            a.equity_quota = v;
        }
        if let Some(v) = self.debt_rate {
            a.debt_rate = v;
        }
        if let Some(v) = self.tenor {
            a.debt_tenor_years = v;
        }
    }
}

/// Where the assumptions come from and how they are checked.
#[derive(Args)]
pub struct AssumptionArgs {
    /// Assumptions file (JSON, or YAML with a .yaml/.yml extension).
    /// Without it piped stdin is read, otherwise the base case is used.
    #[arg(long)]
    pub assumptions: Option<String>,

    /// Skip the input range check (the model's own invariants still apply)
    #[arg(long)]
    pub no_bounds: bool,

    #[command(flatten)]
    pub overrides: AssumptionOverrides,
}

impl AssumptionArgs {
    pub fn resolve(&self) -> Result<Assumptions, Box<dyn std::error::Error>> {
        let mut assumptions: Assumptions = if let Some(ref path) = self.assumptions {
            input::file::read_config(path)?
        } else if let Some(a) = input::stdin::read_stdin()? {
            a
        } else {
            Assumptions::default()
        };
        self.overrides.apply(&mut assumptions);

        if !self.no_bounds {
            check_bounds(&assumptions)?;
        }
        Ok(assumptions)
    }
}

/// Arguments shared by every portfolio calculation
#[derive(Args)]
pub struct ModelArgs {
    /// Portfolio CSV with columns Objekt, Vorschlag_kWp, Verbrauch_kWh
    #[arg(long)]
    pub portfolio: String,

    /// Objects to include (comma-separated identifiers); all when omitted
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

/// Arguments for the CSV export
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Output path for the cash-flow CSV
    #[arg(long, default_value = CASH_FLOW_FILE_NAME)]
    pub out: String,

    /// Also write the year-1 per-object table to this path
    #[arg(long)]
    pub snapshot_out: Option<String>,
}

fn run(args: &ModelArgs) -> Result<ComputationOutput<PortfolioModelOutput>, Box<dyn std::error::Error>> {
    let portfolio: Vec<PortfolioObject> = input::file::read_portfolio_csv(&args.portfolio)?;
    let assumptions = args.assumptions.resolve()?;
    info!(
        "Loaded {} portfolio objects from {}",
        portfolio.len(),
        args.portfolio
    );
    Ok(compute(&portfolio, &args.select, &assumptions)?)
}

fn log_warnings(warnings: &[String]) {
    for w in warnings {
        warn!("{w}");
    }
}

pub fn run_model(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let output = run(&args)?;
    log_warnings(&output.warnings);
    Ok(serde_json::to_value(output)?)
}

pub fn run_snapshot(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let output = run(&args)?;
    log_warnings(&output.warnings);
    Ok(serde_json::to_value(output.result.snapshot.rows)?)
}

pub fn run_cashflows(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let output = run(&args)?;
    log_warnings(&output.warnings);
    Ok(serde_json::to_value(output.result.projection)?)
}

pub fn run_kpis(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let output = run(&args)?;
    let kpis = &output.result.kpis;

    let mut result = serde_json::Map::new();
    for (label, value) in kpis.display_lines() {
        result.insert(label.to_string(), Value::String(value));
    }
    Ok(json!({
        "result": result,
        "warnings": output.warnings,
        "methodology": output.methodology,
    }))
}

pub fn run_export(args: ExportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let output = run(&args.model)?;
    log_warnings(&output.warnings);

    let file = File::create(&args.out)
        .map_err(|e| format!("Failed to create '{}': {}", args.out, e))?;
    write_cash_flows_csv(&output.result.projection, file)?;
    info!("Wrote {} years to {}", output.result.projection.len(), args.out);

    let mut written = vec![args.out.clone()];
    if let Some(ref path) = args.snapshot_out {
        let file =
            File::create(path).map_err(|e| format!("Failed to create '{}': {}", path, e))?;
        write_snapshot_csv(&output.result.snapshot.rows, file)?;
        written.push(path.clone());
    }

    Ok(json!({
        "files": written,
        "years": output.result.projection.len(),
        "objects": output.result.snapshot.rows.len(),
    }))
}

/// Input ranges, defaults and steps next to the values in effect.
pub fn run_assumptions(args: AssumptionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = args.resolve()?;
    let rows: Vec<Value> = BOUNDS
        .iter()
        .zip(input_values(&assumptions))
        .map(|(b, (_, value))| {
            json!({
                "option": b.option,
                "unit": b.unit,
                "value": value.normalize().to_string(),
                "min": b.min.to_string(),
                "max": b.max.to_string(),
                "default": b.default.to_string(),
                "step": b.step.to_string(),
            })
        })
        .collect();
    Ok(Value::Array(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_convert_percentages() {
        let overrides = AssumptionOverrides {
            degradation_pct: Some(dec!(0.8)),
            inflation_pct: Some(dec!(3)),
            horizon: Some(25),
            ..Default::default()
        };
        let mut a = Assumptions::default();
        overrides.apply(&mut a);

        assert_eq!(a.degradation, dec!(0.008));
        assert_eq!(a.inflation, dec!(0.03));
        assert_eq!(a.horizon_years, 25);
        assert_eq!(a.specific_yield, dec!(930));
    }

    fn model_args(dir: &tempfile::TempDir, select: &[&str]) -> ModelArgs {
        let portfolio = dir.path().join("portfolio.csv");
        std::fs::write(
            &portfolio,
            "Objekt,Vorschlag_kWp,Verbrauch_kWh\nSchule,80,45000\nRathaus,20,\n",
        )
        .unwrap();
        let assumptions = dir.path().join("assumptions.json");
        std::fs::write(&assumptions, r#"{"horizon_years": 10}"#).unwrap();

        ModelArgs {
            portfolio: portfolio.display().to_string(),
            select: select.iter().map(|s| s.to_string()).collect(),
            assumptions: AssumptionArgs {
                assumptions: Some(assumptions.display().to_string()),
                no_bounds: false,
                overrides: AssumptionOverrides::default(),
            },
        }
    }

    #[test]
    fn test_run_model_keeps_warnings_in_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let value = run_model(model_args(&dir, &["Schule", "Rathaus", "Bahnhof"])).unwrap();

        let warnings: Vec<&str> = value["warnings"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(warnings.iter().any(|w| w.contains("'Bahnhof'")));
        assert!(warnings.iter().any(|w| w.contains("'Rathaus'")));
        assert_eq!(value["result"]["projection"].as_array().unwrap().len(), 11);
    }

    #[test]
    fn test_run_kpis_labels() {
        let dir = tempfile::tempdir().unwrap();
        let value = run_kpis(model_args(&dir, &[])).unwrap();
        assert_eq!(value["result"]["CAPEX"], "100,000 €");
    }

    #[test]
    fn test_no_overrides_keep_assumptions() {
        let mut a = Assumptions::default();
        AssumptionOverrides::default().apply(&mut a);
        assert_eq!(a, Assumptions::default());
    }
}
