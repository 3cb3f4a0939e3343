use pretty_assertions::assert_eq;
use pv_portfolio_core::assumptions::Assumptions;
use pv_portfolio_core::export::cash_flows_csv_string;
use pv_portfolio_core::kpi::DscrStats;
use pv_portfolio_core::portfolio::{read_portfolio, PortfolioObject};
use pv_portfolio_core::projection::FinancingStructure;
use pv_portfolio_core::time_value::{annuity, npv};
use pv_portfolio_core::{compute, PvFinanceError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// End-to-end base case
// ===========================================================================

fn single_site() -> Vec<PortfolioObject> {
    vec![PortfolioObject::new("Musterstr. 1", dec!(100), dec!(60000))]
}

#[test]
fn test_base_case_financing() {
    let out = compute(&single_site(), &[], &Assumptions::default()).unwrap();
    let fin = out.result.financing;

    assert_eq!(
        fin,
        FinancingStructure {
            capex: dec!(100000),
            debt: dec!(70000),
            equity: dec!(30000),
            debt_service: annuity(dec!(70000), dec!(0.05), 15).unwrap(),
        }
    );
}

#[test]
fn test_base_case_year_one_volumes() {
    let out = compute(&single_site(), &[], &Assumptions::default()).unwrap();
    let row = &out.result.snapshot.rows[0];

    assert_eq!(row.generation_kwh, dec!(93000));
    assert_eq!(row.self_consumed_kwh, dec!(51150));
    assert_eq!(row.exported_kwh, dec!(41850));
    assert_eq!(out.result.projection[1].ebitda, row.ebitda);
}

#[test]
fn test_base_case_irrs_zero_npv() {
    let out = compute(&single_site(), &[], &Assumptions::default()).unwrap();
    let res = &out.result;

    let unlevered = res.kpis.unlevered_irr.expect("unlevered IRR should converge");
    let levered = res.kpis.levered_irr.expect("equity IRR should converge");

    let mut project_cfs = vec![-res.financing.capex];
    project_cfs.extend(res.projection.iter().skip(1).map(|r| r.ebitda));
    let equity_cfs: Vec<Decimal> = res.projection.iter().map(|r| r.equity_cf).collect();

    assert!(npv(unlevered, &project_cfs).unwrap().abs() < dec!(0.000001));
    assert!(npv(levered, &equity_cfs).unwrap().abs() < dec!(0.000001));
    assert!(
        unlevered > dec!(0.05) && unlevered < dec!(0.25),
        "Unlevered IRR out of range: {unlevered}"
    );
}

#[test]
fn test_base_case_dscr_stats() {
    let out = compute(&single_site(), &[], &Assumptions::default()).unwrap();
    let res = &out.result;

    let stats = DscrStats::from_records(&res.projection);
    assert_eq!(res.kpis.dscr_min, stats.min);
    assert_eq!(res.kpis.dscr_avg, stats.avg);

    // Only the 15 debt years carry a DSCR
    let defined = res.projection.iter().filter(|r| r.dscr.is_some()).count();
    assert_eq!(defined, 15);
    for r in res.projection.iter().filter(|r| r.dscr.is_some()) {
        assert_eq!(r.dscr, Some(r.cfads / r.debt_service));
    }
}

#[test]
fn test_all_equity_has_no_dscr() {
    let a = Assumptions {
        equity_quota: Decimal::ONE,
        ..Default::default()
    };
    let out = compute(&single_site(), &[], &a).unwrap();
    let kpis = &out.result.kpis;

    assert_eq!(kpis.dscr_min, None);
    assert_eq!(kpis.dscr_avg, None);
    // Without debt both IRRs describe the same cash flows
    assert_eq!(kpis.unlevered_irr, kpis.levered_irr);
}

#[test]
fn test_zero_interest_straight_line_debt() {
    let a = Assumptions {
        debt_rate: Decimal::ZERO,
        debt_tenor_years: 14,
        ..Default::default()
    };
    let out = compute(&single_site(), &[], &a).unwrap();
    assert_eq!(out.result.financing.debt_service, dec!(5000));
    assert_eq!(out.result.projection[14].debt_service, dec!(5000));
    assert_eq!(out.result.projection[15].debt_service, Decimal::ZERO);
}

// ===========================================================================
// Selection
// ===========================================================================

fn small_portfolio() -> Vec<PortfolioObject> {
    vec![
        PortfolioObject::new("A", dec!(30), dec!(15000)),
        PortfolioObject::new("B", dec!(45), dec!(40000)),
        PortfolioObject::new("C", dec!(25), dec!(9000)),
    ]
}

#[test]
fn test_empty_selection_equals_all() {
    let all_ids: Vec<String> = small_portfolio().iter().map(|o| o.id.clone()).collect();
    let empty = compute(&small_portfolio(), &[], &Assumptions::default()).unwrap();
    let explicit = compute(&small_portfolio(), &all_ids, &Assumptions::default()).unwrap();

    assert_eq!(empty.result, explicit.result);
}

#[test]
fn test_subset_selection() {
    let ids = vec!["A".to_string(), "C".to_string()];
    let out = compute(&small_portfolio(), &ids, &Assumptions::default()).unwrap();

    assert_eq!(out.result.snapshot.totals.capacity_kwp, dec!(55));
    assert_eq!(out.result.snapshot.totals.consumption_kwh, dec!(24000));
    assert_eq!(out.result.financing.capex, dec!(55000));
}

// ===========================================================================
// Portfolio file and export
// ===========================================================================

#[test]
fn test_csv_round_through_model() {
    let data = "Objekt,Vorschlag_kWp,Verbrauch_kWh\n\
                Schule,80,45000\n\
                Rathaus,,30000\n\
                Turnhalle,20,12000\n";
    let portfolio = read_portfolio(data.as_bytes()).unwrap();
    let a = Assumptions {
        horizon_years: 12,
        ..Default::default()
    };
    let out = compute(&portfolio, &[], &a).unwrap();

    assert_eq!(out.result.snapshot.totals.capacity_kwp, dec!(100));
    assert!(out.warnings.iter().any(|w| w.contains("'Rathaus'")));

    let csv = cash_flows_csv_string(&out.result.projection).unwrap();
    assert_eq!(csv.lines().count(), 14);
    assert_eq!(
        csv.lines().next().unwrap(),
        "Year,EBITDA,DebtService,CFADS,EquityCF,DSCR"
    );
}

#[test]
fn test_duplicate_ids_rejected() {
    let portfolio = vec![
        PortfolioObject::new("A", dec!(1), dec!(1)),
        PortfolioObject::new("A", dec!(2), dec!(2)),
    ];
    let err = compute(&portfolio, &[], &Assumptions::default()).unwrap_err();
    assert!(matches!(err, PvFinanceError::InvalidInput { .. }));
}

#[test]
fn test_output_serialises_with_envelope() {
    let out = compute(&single_site(), &[], &Assumptions::default()).unwrap();
    let value = serde_json::to_value(&out).unwrap();

    assert!(value["result"]["kpis"]["unlevered_irr"].is_string());
    assert_eq!(value["assumptions"]["horizon_years"], 20);
    assert_eq!(value["result"]["projection"][0]["Year"], 0);
    assert!(value["result"]["projection"][16]["DSCR"].is_null());
}

// ===========================================================================
// Out-of-range inputs
// ===========================================================================

#[test]
fn test_long_escalating_horizon_is_error() {
    let a = Assumptions {
        horizon_years: 2000,
        inflation: dec!(0.05),
        ..Default::default()
    };
    let err = compute(&single_site(), &[], &a).unwrap_err();
    match err {
        PvFinanceError::InvalidInput { field, .. } => assert_eq!(field, "horizon_years"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_extreme_debt_terms_still_compute() {
    let a = Assumptions {
        debt_rate: dec!(1),
        debt_tenor_years: 100,
        ..Default::default()
    };
    let out = compute(&single_site(), &[], &a).unwrap();
    // Interest-only limit: 70,000 debt at 100%
    assert_eq!(out.result.financing.debt_service, dec!(70000));
    assert!(out.warnings.iter().any(|w| w.contains("exceeds the analysis horizon")));
    assert!(out.warnings.iter().any(|w| w.contains("covenant")));
}

#[test]
fn test_oversized_site_is_error() {
    let portfolio = vec![PortfolioObject::new("A", Decimal::MAX, dec!(1))];
    let err = compute(&portfolio, &[], &Assumptions::default()).unwrap_err();
    assert!(matches!(err, PvFinanceError::InvalidInput { .. }));
}
