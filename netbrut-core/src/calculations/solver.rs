//! Monthly gross-up: find the invoice that delivers a target net.
//!
//! For an invoice `G` (excluding VAT) and a running [`EngineState`]:
//!
//! | Step | Quantity | Formula |
//! |------|----------|---------|
//! | 1 | income tax | `bracket_tax(cumulative_base + G) − cumulative_tax` |
//! | 2 | uncapped net | `(G − income_tax − fee) / (1 + r)` |
//! | 3 | premium | `min(max(uncapped_net, 0) × r, cap)` |
//! | 4 | net | `G − income_tax − premium − fee` |
//!
//! The taxable base of a month is the full invoice excluding VAT. Premium
//! and stamp duties are not deducted from it.
//!
//! `net(G)` increases monotonically, so the invoice is found by bisection.
//! The search starts on `[target, 5 × target]` and widens the upper end
//! geometrically until it delivers at least the target. If no such bound
//! exists below the expansion limit, the worst case `5 × target` is used and
//! the result is flagged [`SolveStatus::Unbracketed`]. Bisection runs a fixed
//! number of iterations; there is no residual-based exit.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use netbrut_core::{FiscalYearConfig, SolveStatus};
//! use netbrut_core::calculations::{EngineState, GrossUpSolver};
//!
//! let solver = GrossUpSolver::from_config(&FiscalYearConfig::turkey_2025()).unwrap();
//! let mut state = EngineState::default();
//!
//! // 5,000 EUR at 40 TRY/EUR, full premium rate, 45 EUR fee
//! let solution = solver.solve(&mut state, dec!(200000), dec!(0.3775), dec!(1800));
//!
//! assert_eq!(solution.status, SolveStatus::Converged);
//! assert!((solution.breakdown.net - dec!(200000)).abs() < dec!(0.01));
//! assert_eq!(state.cumulative_taxable_base, solution.breakdown.invoice);
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::calculations::premium::PremiumSchedule;
use crate::calculations::tariff::{ProgressiveTariff, TariffError};
use crate::models::{FiscalYearConfig, SolveStatus};

/// Decimal places kept for bisection midpoints.
const MIDPOINT_SCALE: u32 = 10;

/// Tuning of the bisection search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Number of bisection steps after a bracket is found.
    pub iterations: u32,
    /// Initial upper bound as a multiple of the target.
    pub initial_multiplier: Decimal,
    /// Growth of the multiplier per widening step.
    pub expansion_factor: Decimal,
    /// Widening stops once the multiplier would exceed this value.
    pub max_multiplier: Decimal,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            iterations: 60,
            initial_multiplier: dec!(5),
            expansion_factor: dec!(2),
            max_multiplier: dec!(10000),
        }
    }
}

/// Year-to-date accumulator threaded through the months of one run.
///
/// A fresh state must be used per calculation; months are applied strictly
/// in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub cumulative_taxable_base: Decimal,
    pub cumulative_tax: Decimal,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a solved month to the running totals.
    pub fn advance(
        &mut self,
        breakdown: &Breakdown,
    ) {
        self.cumulative_taxable_base += breakdown.invoice;
        self.cumulative_tax += breakdown.income_tax;
    }
}

/// Components of one evaluated invoice, in TRY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Invoice excluding VAT; also the month's taxable base.
    pub invoice: Decimal,
    pub income_tax: Decimal,
    pub premium: Decimal,
    pub accounting_fee: Decimal,
    pub net: Decimal,
    /// Whether the premium hit its monthly ceiling.
    pub premium_capped: bool,
}

/// Solved invoice for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSolution {
    pub breakdown: Breakdown,
    pub status: SolveStatus,
}

/// Bisection solver over a tariff and premium schedule.
#[derive(Debug, Clone)]
pub struct GrossUpSolver {
    tariff: ProgressiveTariff,
    premiums: PremiumSchedule,
    settings: SolverSettings,
}

impl GrossUpSolver {
    pub fn new(
        tariff: ProgressiveTariff,
        premiums: PremiumSchedule,
        settings: SolverSettings,
    ) -> Self {
        Self {
            tariff,
            premiums,
            settings,
        }
    }

    /// Builds a solver from the tariff, premium cap and solver settings of a
    /// fiscal year.
    ///
    /// # Errors
    ///
    /// Returns [`TariffError`] if the bracket table is inconsistent.
    pub fn from_config(config: &FiscalYearConfig) -> Result<Self, TariffError> {
        Ok(Self::new(
            ProgressiveTariff::from_config(config)?,
            PremiumSchedule::from_config(config),
            config.solver.clone(),
        ))
    }

    pub fn tariff(&self) -> &ProgressiveTariff {
        &self.tariff
    }

    pub fn premiums(&self) -> &PremiumSchedule {
        &self.premiums
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Evaluates every component for a candidate `invoice` without touching
    /// `state`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use netbrut_core::FiscalYearConfig;
    /// use netbrut_core::calculations::{EngineState, GrossUpSolver};
    ///
    /// let solver = GrossUpSolver::from_config(&FiscalYearConfig::turkey_2025()).unwrap();
    /// let state = EngineState::default();
    ///
    /// let breakdown = solver.evaluate(&state, dec!(100000), dec!(0.25), dec!(0));
    ///
    /// // tax 15,000; uncapped net 85,000 / 1.25 = 68,000; premium 17,000
    /// assert_eq!(breakdown.income_tax, dec!(15000));
    /// assert_eq!(breakdown.premium, dec!(17000));
    /// assert_eq!(breakdown.net, dec!(68000));
    /// ```
    pub fn evaluate(
        &self,
        state: &EngineState,
        invoice: Decimal,
        premium_rate: Decimal,
        accounting_fee: Decimal,
    ) -> Breakdown {
        let income_tax = self
            .tariff
            .bracket_tax(state.cumulative_taxable_base + invoice)
            - state.cumulative_tax;
        let net_uncapped = (invoice - income_tax - accounting_fee) / (Decimal::ONE + premium_rate);
        let uncapped_premium = net_uncapped * premium_rate;
        let premium = self.premiums.premium(net_uncapped, premium_rate);
        let net = invoice - income_tax - premium - accounting_fee;

        Breakdown {
            invoice,
            income_tax,
            premium,
            accounting_fee,
            net,
            premium_capped: uncapped_premium > self.premiums.cap(),
        }
    }

    /// Finds the invoice whose net equals `target_net`, then advances `state`
    /// by the solved month.
    ///
    /// Never fails: an unbracketed search returns the worst-case invoice with
    /// [`SolveStatus::Unbracketed`].
    pub fn solve(
        &self,
        state: &mut EngineState,
        target_net: Decimal,
        premium_rate: Decimal,
        accounting_fee: Decimal,
    ) -> InvoiceSolution {
        let net_at = |invoice: Decimal| {
            self.evaluate(state, invoice, premium_rate, accounting_fee)
                .net
        };

        let worst_case = target_net * self.settings.initial_multiplier;
        let mut low = target_net;
        let mut high = worst_case;
        let mut multiplier = self.settings.initial_multiplier;
        let mut bracketed = true;

        while net_at(high) < target_net {
            let next = multiplier * self.settings.expansion_factor;
            if next > self.settings.max_multiplier {
                bracketed = false;
                break;
            }
            let Some(wider) = target_net.checked_mul(next) else {
                bracketed = false;
                break;
            };
            low = high;
            multiplier = next;
            high = wider;
            trace!(%multiplier, "widening invoice search bracket");
        }

        let (invoice, status) = if bracketed {
            for _ in 0..self.settings.iterations {
                let mid = midpoint(low, high);
                if net_at(mid) > target_net {
                    high = mid;
                } else {
                    low = mid;
                }
            }
            (midpoint(low, high), SolveStatus::Converged)
        } else {
            warn!(
                %target_net,
                %worst_case,
                "invoice search did not bracket the target; using worst case"
            );
            (worst_case, SolveStatus::Unbracketed)
        };

        let breakdown = self.evaluate(state, invoice, premium_rate, accounting_fee);
        state.advance(&breakdown);

        InvoiceSolution { breakdown, status }
    }
}

fn midpoint(
    low: Decimal,
    high: Decimal,
) -> Decimal {
    ((low + high) / Decimal::TWO).round_dp(MIDPOINT_SCALE)
}
