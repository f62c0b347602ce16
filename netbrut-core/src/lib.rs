pub mod calculations;
pub mod models;
pub mod rates;

pub use calculations::{CalculationError, YearlyDriver};
pub use models::*;
pub use rates::{RateCache, RateError, RateProvider};
