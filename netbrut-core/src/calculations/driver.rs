//! Year-to-date driver: solves every month of a rate series in order.
//!
//! Each run owns a fresh [`EngineState`]; nothing is carried between runs.
//! Any change of input (rates, override, premium policy) therefore means a
//! full recomputation from the first month.
//!
//! # Rate resolution
//!
//! | Situation | Rate used | Notice |
//! |-----------|-----------|--------|
//! | current month and an override is given | the override | none |
//! | month rate present and positive | the month rate | none |
//! | otherwise | `current_rate`, else last good rate of the run, else 1 | `RateFallback` |

use chrono::Month;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::solver::{EngineState, GrossUpSolver};
use crate::calculations::tariff::TariffError;
use crate::models::{
    CalculationInput, Currency, FiscalYearConfig, MonthAmounts, MonthCalculation, MonthNotice,
    MonthlyRate, PremiumPolicy, RateProvenance, RateSeries, SolveStatus, YearlyResult,
    YearlyTotals,
};

/// Largest net target accepted, and largest monthly target in TRY after
/// conversion. Keeps every solver step within `Decimal` range.
pub const MAX_TARGET: Decimal = dec!(1000000000000);

/// Fatal errors of a yearly run. No partial result is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no exchange rate for {} {}", .month.name(), .year)]
    MissingRateData { year: i32, month: Month },
}

/// Drives the gross-up solver across a year.
#[derive(Debug, Clone)]
pub struct YearlyDriver {
    config: FiscalYearConfig,
    solver: GrossUpSolver,
    static_fallback: Option<RateSeries>,
}

impl YearlyDriver {
    /// # Errors
    ///
    /// Returns [`TariffError`] if the bracket table of `config` is inconsistent.
    pub fn new(config: FiscalYearConfig) -> Result<Self, TariffError> {
        let solver = GrossUpSolver::from_config(&config)?;
        Ok(Self {
            config,
            solver,
            static_fallback: None,
        })
    }

    /// Series used when the supplied one has no entry for the start month.
    pub fn with_static_fallback(
        mut self,
        series: RateSeries,
    ) -> Self {
        self.static_fallback = Some(series);
        self
    }

    pub fn config(&self) -> &FiscalYearConfig {
        &self.config
    }

    pub fn solver(&self) -> &GrossUpSolver {
        &self.solver
    }

    /// Runs the full year.
    ///
    /// # Errors
    ///
    /// - [`CalculationError::InvalidInput`] for a non-positive or oversized
    ///   target, a premium rate outside `[0, 1)`, a non-positive override, or
    ///   a start year after the series year.
    /// - [`CalculationError::MissingRateData`] when neither the series nor the
    ///   static fallback has an entry for the first month.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::Month;
    /// use rust_decimal_macros::dec;
    /// use netbrut_core::calculations::YearlyDriver;
    /// use netbrut_core::{
    ///     CalculationInput, Currency, FiscalYearConfig, MonthlyRate, PremiumPolicy,
    ///     RateProvenance, RateSeries,
    /// };
    ///
    /// let config = FiscalYearConfig::turkey_2025();
    /// let driver = YearlyDriver::new(config.clone()).unwrap();
    /// let series = RateSeries::new(
    ///     2025,
    ///     vec![MonthlyRate {
    ///         month: Month::January,
    ///         label: "Ocak".to_string(),
    ///         rate: Some(dec!(40)),
    ///         rate_date: None,
    ///         is_current: false,
    ///         provenance: RateProvenance::Static,
    ///     }],
    /// );
    /// let input = CalculationInput {
    ///     target_net: dec!(5000),
    ///     currency: Currency::Eur,
    ///     start_month: Month::January,
    ///     start_year: 2025,
    ///     premium_policy: PremiumPolicy::full(&config),
    ///     include_vat: false,
    ///     manual_rate_override: None,
    ///     current_rate: None,
    /// };
    ///
    /// let result = driver.calculate(&input, &series).unwrap();
    ///
    /// assert_eq!(result.months.len(), 1);
    /// assert!((result.totals.totals_eur.net - dec!(5000)).abs() < dec!(0.01));
    /// ```
    pub fn calculate(
        &self,
        input: &CalculationInput,
        series: &RateSeries,
    ) -> Result<YearlyResult, CalculationError> {
        validate(input, series)?;

        let first_operative_year = input.start_year == series.year;
        let first_month = if first_operative_year {
            input.start_month
        } else {
            Month::January
        };
        let months = self.months_from(series, first_month)?;

        let mut state = EngineState::new();
        let mut last_good_rate: Option<Decimal> = None;
        let mut calculations = Vec::with_capacity(months.len());

        for (offset, entry) in months.iter().enumerate() {
            let (rate, provenance, fallback) = resolve_rate(entry, input, last_good_rate);
            if fallback.is_none() {
                last_good_rate = Some(rate);
            }

            let target = match input.currency {
                Currency::Eur => converted(input.target_net, rate, "target net")?,
                Currency::Try => input.target_net,
            };
            let accounting_fee = converted(self.config.accounting_fee_eur, rate, "accounting fee")?;
            let premium_rate = input
                .premium_policy
                .rate_for(first_operative_year && offset == 0);

            let solution = self
                .solver
                .solve(&mut state, target, premium_rate, accounting_fee);
            let breakdown = &solution.breakdown;

            let vat = if input.include_vat {
                breakdown.invoice * self.config.vat_rate
            } else {
                Decimal::ZERO
            };

            let mut notices = Vec::new();
            if let Some(notice) = fallback {
                notices.push(notice);
            }
            if solution.status == SolveStatus::Unbracketed {
                notices.push(MonthNotice::NonConvergence {
                    worst_case: breakdown.invoice,
                });
            }

            debug!(
                month = entry.label.as_str(),
                %rate,
                invoice = %breakdown.invoice,
                income_tax = %breakdown.income_tax,
                premium = %breakdown.premium,
                cumulative_base = %state.cumulative_taxable_base,
                "solved month"
            );

            calculations.push(MonthCalculation {
                month: entry.month,
                label: entry.label.clone(),
                rate,
                rate_provenance: provenance,
                premium_rate,
                amounts: MonthAmounts {
                    net: breakdown.net,
                    premium: breakdown.premium,
                    income_tax: breakdown.income_tax,
                    accounting_fee: breakdown.accounting_fee,
                    invoice_excl_vat: breakdown.invoice,
                    vat,
                    invoice_incl_vat: breakdown.invoice + vat,
                    declaration_stamp: self.config.stamp_duty.for_month(entry.month),
                },
                taxable_base: breakdown.invoice,
                cumulative_taxable_base: state.cumulative_taxable_base,
                cumulative_tax: state.cumulative_tax,
                bracket: self
                    .solver
                    .tariff()
                    .bracket_of(state.cumulative_taxable_base),
                status: solution.status,
                notices,
            });
        }

        let totals = self.totals(&calculations, &state);
        Ok(YearlyResult {
            year: series.year,
            currency: input.currency,
            months: calculations,
            totals,
        })
    }

    /// Entries to process: the first month and everything after it, taken
    /// from the series or, failing that, from the static fallback.
    fn months_from<'a>(
        &'a self,
        series: &'a RateSeries,
        first_month: Month,
    ) -> Result<&'a [MonthlyRate], CalculationError> {
        if let Some(position) = series.position_of(first_month) {
            return Ok(&series.months[position..]);
        }

        let fallback = self.static_fallback.as_ref().and_then(|table| {
            table
                .position_of(first_month)
                .map(|position| &table.months[position..])
        });
        match fallback {
            Some(months) => {
                warn!(
                    month = first_month.name(),
                    year = series.year,
                    "start month missing from rate series; using static rate table"
                );
                Ok(months)
            }
            None => Err(CalculationError::MissingRateData {
                year: series.year,
                month: first_month,
            }),
        }
    }

    fn totals(
        &self,
        months: &[MonthCalculation],
        state: &EngineState,
    ) -> YearlyTotals {
        let mut totals_try = MonthAmounts::default();
        let mut totals_eur = MonthAmounts::default();
        for month in months {
            totals_try += &month.amounts;
            totals_eur += &month.amounts_in(Currency::Eur);
        }

        YearlyTotals {
            months: months.len(),
            totals_try,
            totals_eur,
            taxable_base: state.cumulative_taxable_base,
            income_tax: state.cumulative_tax,
            final_bracket: self
                .solver
                .tariff()
                .bracket_of(state.cumulative_taxable_base),
            any_fallback: months.iter().any(MonthCalculation::used_rate_fallback),
            any_non_convergence: months
                .iter()
                .any(|m| m.status == SolveStatus::Unbracketed),
        }
    }
}

fn validate(
    input: &CalculationInput,
    series: &RateSeries,
) -> Result<(), CalculationError> {
    if input.target_net <= Decimal::ZERO {
        return Err(CalculationError::InvalidInput(format!(
            "target net must be positive, got {}",
            input.target_net
        )));
    }
    if input.target_net > MAX_TARGET {
        return Err(CalculationError::InvalidInput(format!(
            "target net {} exceeds the supported maximum of {MAX_TARGET}",
            input.target_net
        )));
    }
    let premium_rates = match input.premium_policy {
        PremiumPolicy::Flat(rate) => vec![rate],
        PremiumPolicy::FirstMonthFull { full, discounted } => vec![full, discounted],
    };
    if let Some(rate) = premium_rates
        .into_iter()
        .find(|rate| *rate < Decimal::ZERO || *rate >= Decimal::ONE)
    {
        return Err(CalculationError::InvalidInput(format!(
            "premium rate must be in [0, 1), got {rate}"
        )));
    }
    if let Some(rate) = input.manual_rate_override
        && rate <= Decimal::ZERO
    {
        return Err(CalculationError::InvalidInput(format!(
            "manual rate override must be positive, got {rate}"
        )));
    }
    if input.start_year > series.year {
        return Err(CalculationError::InvalidInput(format!(
            "start year {} is after calculation year {}",
            input.start_year, series.year
        )));
    }
    Ok(())
}

/// `amount × rate` in TRY, rejected when it overflows or exceeds [`MAX_TARGET`].
fn converted(
    amount: Decimal,
    rate: Decimal,
    what: &str,
) -> Result<Decimal, CalculationError> {
    amount
        .checked_mul(rate)
        .filter(|value| *value <= MAX_TARGET)
        .ok_or_else(|| {
            CalculationError::InvalidInput(format!(
                "{what} of {amount} at rate {rate} exceeds the supported maximum of {MAX_TARGET} TRY"
            ))
        })
}

fn resolve_rate(
    entry: &MonthlyRate,
    input: &CalculationInput,
    last_good_rate: Option<Decimal>,
) -> (Decimal, RateProvenance, Option<MonthNotice>) {
    if entry.is_current
        && let Some(rate) = input.manual_rate_override
    {
        return (rate, RateProvenance::Manual, None);
    }
    if let Some(rate) = entry.usable_rate() {
        return (rate, entry.provenance, None);
    }

    let substituted = input
        .current_rate
        .filter(|rate| *rate > Decimal::ZERO)
        .or(last_good_rate)
        .unwrap_or(Decimal::ONE);
    warn!(
        month = entry.label.as_str(),
        original = ?entry.rate,
        %substituted,
        "unusable exchange rate; substituting fallback"
    );
    (
        substituted,
        entry.provenance,
        Some(MonthNotice::RateFallback {
            original: entry.rate,
            substituted,
        }),
    )
}
