mod calculation_input;
mod currency;
mod fiscal_year_config;
mod month_calculation;
mod monthly_rate;
mod tax_bracket;
mod yearly_result;

pub use calculation_input::{CalculationInput, PremiumPolicy};
pub use currency::Currency;
pub use fiscal_year_config::{FiscalYearConfig, StampDutySchedule};
pub use month_calculation::{MonthAmounts, MonthCalculation, MonthNotice, SolveStatus};
pub use monthly_rate::{MONTH_LABELS, MonthlyRate, RateProvenance, RateSeries, month_label};
pub use tax_bracket::{BracketClass, TaxBracket};
pub use yearly_result::{YearlyResult, YearlyTotals};
