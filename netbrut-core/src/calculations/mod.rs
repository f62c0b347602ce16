//! Net-to-gross calculation engine.
//!
//! [`ProgressiveTariff`] and [`PremiumSchedule`] are pure functions over a
//! fiscal-year ruleset. [`GrossUpSolver`] inverts them for a single month and
//! [`YearlyDriver`] threads the cumulative state through a year of rates.

pub mod common;
pub mod driver;
pub mod premium;
pub mod solver;
pub mod tariff;

pub use driver::{CalculationError, YearlyDriver};
pub use premium::PremiumSchedule;
pub use solver::{Breakdown, EngineState, GrossUpSolver, InvoiceSolution, SolverSettings};
pub use tariff::{ProgressiveTariff, TariffError};
