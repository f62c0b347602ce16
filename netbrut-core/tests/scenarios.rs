//! End-to-end scenarios for the yearly driver and gross-up solver.

use chrono::Month;
use netbrut_core::calculations::{EngineState, GrossUpSolver, ProgressiveTariff};
use netbrut_core::{
    CalculationInput, Currency, FiscalYearConfig, MonthlyRate, PremiumPolicy, RateProvenance,
    RateSeries, SolveStatus, YearlyDriver, month_label,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOLERANCE: Decimal = dec!(0.01);

fn series(rates: &[Decimal]) -> RateSeries {
    let mut month = Month::January;
    let mut months = Vec::new();
    for rate in rates {
        months.push(MonthlyRate {
            month,
            label: month_label(month).to_string(),
            rate: Some(*rate),
            rate_date: None,
            is_current: false,
            provenance: RateProvenance::Static,
        });
        month = month.succ();
    }
    RateSeries::new(2025, months)
}

fn input(
    target_net: Decimal,
    premium_rate: Decimal,
) -> CalculationInput {
    CalculationInput {
        target_net,
        currency: Currency::Eur,
        start_month: Month::January,
        start_year: 2025,
        premium_policy: PremiumPolicy::Flat(premium_rate),
        include_vat: false,
        manual_rate_override: None,
        current_rate: None,
    }
}

fn driver() -> YearlyDriver {
    YearlyDriver::new(FiscalYearConfig::turkey_2025()).expect("2025 tariff is consistent")
}

fn tariff() -> ProgressiveTariff {
    ProgressiveTariff::from_config(&FiscalYearConfig::turkey_2025()).expect("2025 tariff")
}

// =========================================================================
// single month
// =========================================================================

#[test]
fn five_thousand_eur_at_forty_is_internally_consistent() {
    let result = driver()
        .calculate(&input(dec!(5000), dec!(0.3775)), &series(&[dec!(40)]))
        .expect("calculation succeeds");
    let month = &result.months[0];
    let a = &month.amounts;

    assert_eq!(result.months.len(), 1);
    assert!((a.net - dec!(200000)).abs() < TOLERANCE);
    assert!((a.invoice_excl_vat - (a.net + a.income_tax + a.premium + a.accounting_fee)).abs() < TOLERANCE);
    assert_eq!(a.accounting_fee, dec!(1800));
    assert_eq!(
        a.income_tax,
        tariff().bracket_tax(a.invoice_excl_vat) - tariff().bracket_tax(dec!(0))
    );
    assert_eq!(a.premium, dec!(68264.49));
    assert_eq!(month.status, SolveStatus::Converged);
}

#[test]
fn solver_converges_for_any_positive_target() {
    let config = FiscalYearConfig::turkey_2025();
    let solver = GrossUpSolver::from_config(&config).expect("solver");

    for target in [dec!(0.5), dec!(75), dec!(8400), dec!(61000), dec!(333333.33), dec!(9000000)] {
        for rate in [dec!(0.3275), dec!(0.3775)] {
            let mut state = EngineState::default();
            let solution = solver.solve(&mut state, target, rate, dec!(1800));

            assert!(
                (solution.breakdown.net - target).abs() < TOLERANCE,
                "target {target} at {rate}: got {}",
                solution.breakdown.net
            );
        }
    }
}

#[test]
fn premium_stays_at_cap_as_net_grows() {
    let driver = driver();

    for net in [dec!(6000), dec!(12000), dec!(50000)] {
        let result = driver
            .calculate(&input(net, dec!(0.3775)), &series(&[dec!(40)]))
            .expect("calculation succeeds");

        assert_eq!(result.months[0].amounts.premium, dec!(68264.49));
    }
}

// =========================================================================
// cumulative behaviour
// =========================================================================

#[test]
fn month_crossing_first_boundary_splits_marginal_tax() {
    let result = driver()
        .calculate(&input(dec!(1000), dec!(0.3275)), &series(&[dec!(40); 4]))
        .expect("calculation succeeds");

    let crossing = result
        .months
        .windows(2)
        .find(|pair| {
            pair[0].cumulative_taxable_base < dec!(158000)
                && pair[1].cumulative_taxable_base > dec!(158000)
        })
        .expect("some month crosses 158,000");
    let before = crossing[0].cumulative_taxable_base;
    let after = crossing[1].cumulative_taxable_base;

    let expected = (dec!(158000) - before) * dec!(0.15) + (after - dec!(158000)) * dec!(0.20);
    let flat = crossing[1].taxable_base * dec!(0.15);

    assert!((crossing[1].amounts.income_tax - expected).abs() < dec!(0.000001));
    assert!(crossing[1].amounts.income_tax > flat);
    assert_eq!(crossing[1].bracket.number(), 2);
}

#[test]
fn monthly_tax_is_difference_of_cumulative_tariff() {
    let result = driver()
        .calculate(&input(dec!(4000), dec!(0.3275)), &series(&[dec!(45); 12]))
        .expect("calculation succeeds");
    let tariff = tariff();

    let mut previous_base = Decimal::ZERO;
    for month in &result.months {
        let expected =
            tariff.bracket_tax(month.cumulative_taxable_base) - tariff.bracket_tax(previous_base);
        assert!((month.amounts.income_tax - expected).abs() < dec!(0.000001));
        assert!(month.cumulative_taxable_base >= previous_base);
        previous_base = month.cumulative_taxable_base;
    }
}

#[test]
fn repeated_runs_are_identical() {
    let driver = driver();
    let rates = series(&[
        dec!(37.26),
        dec!(38.01),
        dec!(38.85),
        dec!(43.57),
        dec!(44.96),
        dec!(46.68),
    ]);
    let input = input(dec!(3500), dec!(0.3275));

    let first = driver.calculate(&input, &rates).expect("first run");
    let second = driver.calculate(&input, &rates).expect("second run");

    assert_eq!(first.totals, second.totals);
    assert_eq!(first.months, second.months);
}

#[test]
fn swapping_month_rates_changes_tax_split() {
    let driver = driver();
    let input = input(dec!(5000), dec!(0.3275));

    let ascending = driver
        .calculate(&input, &series(&[dec!(40), dec!(50)]))
        .expect("ascending");
    let descending = driver
        .calculate(&input, &series(&[dec!(50), dec!(40)]))
        .expect("descending");

    // The month at 40 TRY/EUR owes more tax when it comes second.
    let first_at_forty = ascending.months[0].amounts.income_tax;
    let second_at_forty = descending.months[1].amounts.income_tax;
    assert!(second_at_forty > first_at_forty);

    assert!(descending.months[0].cumulative_taxable_base > ascending.months[0].cumulative_taxable_base);
}

#[test]
fn full_year_totals_sum_months() {
    let result = driver()
        .calculate(&input(dec!(2500), dec!(0.3275)), &series(&[dec!(42); 12]))
        .expect("calculation succeeds");

    let net_try: Decimal = result.months.iter().map(|m| m.amounts.net).sum();
    let net_eur: Decimal = result
        .months
        .iter()
        .map(|m| m.amounts_in(Currency::Eur).net)
        .sum();

    assert_eq!(result.totals.totals_try.net, net_try);
    assert_eq!(result.totals.totals_eur.net, net_eur);
    assert!((result.totals.totals_eur.net - dec!(30000)).abs() < dec!(0.05));
    assert_eq!(result.totals.totals_try.declaration_stamp, dec!(3150));
    assert_eq!(
        result.totals.final_bracket,
        tariff().bracket_of(result.totals.taxable_base)
    );
}
