use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tax_optimizer_core::config::TaxYearConfig;
use tax_optimizer_core::profile::TaxProfile;
use tax_optimizer_core::tax::{
    alternative_minimum_tax, bracket_tax, calculate_tax, net_investment_income_tax,
    phase_out_fraction, self_employment_tax, stacked_income_tax, AmtInput, TaxPipeline,
};
use tax_optimizer_core::{FilingStatus, TaxOptimizerError};

fn cfg() -> TaxYearConfig {
    TaxYearConfig::tax_year_2025()
}

fn profile(json: &str) -> TaxProfile {
    TaxProfile::from_json_str(json).unwrap()
}

// ===========================================================================
// Calculators
// ===========================================================================

#[test]
fn test_bracket_tax_published_figures() {
    let c = cfg();
    assert_eq!(bracket_tax(dec!(0), c.ordinary_brackets.get(FilingStatus::Single)), dec!(0));
    // 1,192.50 + 3,369.00
    assert_eq!(
        bracket_tax(dec!(40_000), c.ordinary_brackets.get(FilingStatus::Single)),
        dec!(4_561.50)
    );
    assert_eq!(
        bracket_tax(dec!(80_000), c.ordinary_brackets.get(FilingStatus::Married)),
        dec!(9_123.00)
    );
}

#[test]
fn test_bracket_tax_monotonic_for_every_status() {
    let c = cfg();
    for (_, table) in c.ordinary_brackets.iter() {
        let mut previous = Decimal::ZERO;
        let mut income = Decimal::ZERO;
        while income <= dec!(1_000_000) {
            let tax = bracket_tax(income, table);
            assert!(tax >= previous, "tax fell at {income}");
            previous = tax;
            income += dec!(7_321);
        }
    }
}

#[test]
fn test_stacking_figures() {
    let pref = cfg().preferential_brackets.single.clone();
    assert_eq!(stacked_income_tax(dec!(30_000), dec!(5_000), &pref), dec!(0));
    // 8,350 at 0%, 11,650 at 15%
    assert_eq!(stacked_income_tax(dec!(40_000), dec!(20_000), &pref), dec!(1_747.50));
    // Ordinary exactly at the 0% ceiling: all gain at 15%
    assert_eq!(stacked_income_tax(dec!(48_350), dec!(10_000), &pref), dec!(1_500));
    // Combined exactly at the ceiling: nothing taxed
    assert_eq!(stacked_income_tax(dec!(38_350), dec!(10_000), &pref), dec!(0));
    assert_eq!(stacked_income_tax(dec!(40_000), dec!(0), &pref), dec!(0));
}

#[test]
fn test_self_employment_figures() {
    let params = cfg().self_employment;
    let zero = self_employment_tax(dec!(0), &params);
    assert_eq!((zero.tax, zero.deduction), (dec!(0), dec!(0)));
    let se = self_employment_tax(dec!(100_000), &params);
    assert_eq!(se.tax, dec!(14_129.55));
    assert_eq!(se.deduction.round_dp(2), dec!(7_064.78));
}

#[test]
fn test_niit_figure() {
    let c = cfg();
    let threshold = *c.niit.threshold.get(FilingStatus::Single);
    assert_eq!(
        net_investment_income_tax(dec!(250_000), dec!(30_000), threshold, c.niit.rate),
        dec!(1_140)
    );
}

#[test]
fn test_phase_out_figures() {
    let (start, end) = (dec!(150_000), dec!(400_000));
    assert_eq!(phase_out_fraction(dec!(150_000), start, end), dec!(1));
    assert_eq!(phase_out_fraction(dec!(400_000), start, end), dec!(0));
    assert_eq!(phase_out_fraction(dec!(275_000), start, end), dec!(0.5));
}

#[test]
fn test_amt_never_negative_and_owed_matches_definition() {
    let params = cfg().amt;
    for status in FilingStatus::ALL {
        for taxable in [dec!(0), dec!(50_000), dec!(250_000), dec!(900_000), dec!(3_000_000)] {
            for iso in [dec!(0), dec!(75_000), dec!(400_000)] {
                for regular in [dec!(0), dec!(10_000), dec!(250_000)] {
                    let r = alternative_minimum_tax(
                        &AmtInput {
                            filing_status: status,
                            taxable_income: taxable,
                            regular_tax: regular,
                            salt_deduction: dec!(10_000),
                            iso_spread: iso,
                            private_activity_bond_interest: dec!(0),
                            depreciation_adjustment: dec!(0),
                        },
                        &params,
                    );
                    assert!(r.exemption >= Decimal::ZERO);
                    assert!(r.amt_owed >= Decimal::ZERO);
                    assert_eq!(
                        r.amt_owed,
                        (r.tentative_minimum_tax - r.regular_tax).max(Decimal::ZERO)
                    );
                    assert_eq!(r.amt_margin, r.regular_tax - r.tentative_minimum_tax);
                }
            }
        }
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

#[test]
fn test_end_to_end_single_wages() {
    let r = TaxPipeline::tax_year_2025().compute(&profile(r#"{"income": {"wages": 60000}}"#));
    assert_eq!(r.taxable_income, dec!(44_300));
    assert_eq!(r.regular_tax, dec!(5_077.50));
    assert_eq!(r.final_tax, dec!(5_077.50));
    assert_eq!(r.total_credits, dec!(0));
    assert_eq!(r.refund_or_owed, dec!(-5_077.50));
}

#[test]
fn test_long_term_gain_stacks_on_wages() {
    let r = TaxPipeline::tax_year_2025().compute(&profile(
        r#"{"income": {"wages": 55700}, "capitalGains": {"longTermGains": 20000}}"#,
    ));
    assert_eq!(r.taxable_income, dec!(60_000));
    assert_eq!(r.ordinary_taxable_income, dec!(40_000));
    assert_eq!(r.regular_tax, dec!(4_561.50));
    assert_eq!(r.capital_gains_tax, dec!(1_747.50));
    assert_eq!(r.final_tax, dec!(6_309.00));
}

#[test]
fn test_married_with_children() {
    let r = TaxPipeline::tax_year_2025().compute(&profile(
        r#"{"filingStatus": "married", "income": {"wages": 150000},
            "dependents": [{"name": "A", "age": 5}, {"name": "B", "age": 10}]}"#,
    ));
    // Taxable 118,600: 2,385 + 8,772 + 4,763
    assert_eq!(r.regular_tax, dec!(15_920));
    assert_eq!(r.total_credits, dec!(4_400));
    assert_eq!(r.final_tax, dec!(11_520));
}

#[test]
fn test_withholding_produces_refund() {
    let r = TaxPipeline::tax_year_2025().compute(&profile(
        r#"{"income": {"wages": 60000}, "payments": {"federalWithholding": 6000}}"#,
    ));
    assert_eq!(r.total_payments, dec!(6_000));
    assert_eq!(r.refund_or_owed, dec!(922.50));
}

#[test]
fn test_malformed_amounts_default_to_zero() {
    let p = profile(
        r#"{"income": {"wages": "60,000", "taxableInterest": "n/a",
                       "ordinaryDividends": null, "otherIncome": -500},
            "payments": {"federalWithholding": true}}"#,
    );
    assert_eq!(p.income.wages, dec!(60_000));
    assert_eq!(p.income.taxable_interest, dec!(0));
    assert_eq!(p.income.other_income, dec!(0));
    let r = TaxPipeline::tax_year_2025().compute(&p);
    assert_eq!(r.final_tax, dec!(5_077.50));
    assert_eq!(r.total_payments, dec!(0));
}

#[test]
fn test_empty_profile_is_all_zero() {
    let r = TaxPipeline::tax_year_2025().compute(&TaxProfile::default());
    assert_eq!(r.total_income, dec!(0));
    assert_eq!(r.taxable_income, dec!(0));
    assert_eq!(r.final_tax, dec!(0));
    assert_eq!(r.amt.amt_owed, dec!(0));
}

#[test]
fn test_custom_year_config() {
    let mut c = cfg();
    c.standard_deduction.single = dec!(0);
    let pipeline = TaxPipeline::new(c).unwrap();
    let r = pipeline.compute(&profile(r#"{"income": {"wages": 60000}}"#));
    // 5,578.50 + 11,525 at 22%
    assert_eq!(r.final_tax, dec!(8_114));
}

#[test]
fn test_invalid_config_rejected() {
    let mut c = cfg();
    c.niit.rate = dec!(1.5);
    match TaxPipeline::new(c) {
        Err(TaxOptimizerError::InvalidConfig { field, .. }) => assert_eq!(field, "niit.rate"),
        other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_config_survives_json() {
    let json = cfg().to_json_string().unwrap();
    let loaded = TaxYearConfig::from_json_str(&json).unwrap();
    let p = profile(r#"{"income": {"wages": 60000}}"#);
    assert_eq!(
        TaxPipeline::new(loaded).unwrap().compute(&p),
        TaxPipeline::tax_year_2025().compute(&p)
    );
}

#[test]
fn test_calculate_tax_envelope_and_warnings() {
    let out = calculate_tax(
        &profile(
            r#"{"income": {"wages": 60000, "ordinaryDividends": 100, "qualifiedDividends": 500},
                "capitalGains": {"shortTermLosses": 10000}}"#,
        ),
        &cfg(),
    )
    .unwrap();
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert_eq!(out.result.capital_loss_carryforward, dec!(7_000));
    assert!(out.warnings.iter().any(|w| w.contains("Qualified dividends")));
    assert!(out.warnings.iter().any(|w| w.contains("carries forward")));
}
