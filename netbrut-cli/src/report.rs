use std::fmt;

use netbrut_core::calculations::common::format_thousands;
use netbrut_core::{Currency, MonthAmounts, MonthCalculation, MonthNotice, YearlyResult};
use rust_decimal::Decimal;

use crate::utils::opt_rate_display;

const LABEL_WIDTH: usize = 9;
const AMOUNT_WIDTH: usize = 14;

/// Printable month-by-month table of a [`YearlyResult`].
///
/// Amounts are shown in `display` currency; EUR figures convert each month
/// at its own rate. VAT columns appear only when some month carries VAT.
pub struct Report<'a> {
    result: &'a YearlyResult,
    display: Currency,
}

impl<'a> Report<'a> {
    pub fn new(
        result: &'a YearlyResult,
        display: Currency,
    ) -> Self {
        Self { result, display }
    }

    fn with_vat(&self) -> bool {
        self.result.totals.totals_try.vat > Decimal::ZERO
    }

    fn write_header(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:<LABEL_WIDTH$}{:>9} {:<7}", "Month", "Rate", "Source")?;
        let mut columns = vec!["Net", "Premium", "Income tax", "Fee", "Invoice"];
        if self.with_vat() {
            columns.extend(["VAT", "Invoice+VAT"]);
        }
        columns.push("Stamp");
        for column in columns {
            write!(f, "{column:>AMOUNT_WIDTH$}")?;
        }
        writeln!(f, "  Bracket")
    }

    fn write_amounts(
        &self,
        f: &mut fmt::Formatter<'_>,
        amounts: &MonthAmounts,
    ) -> fmt::Result {
        let mut values = vec![
            amounts.net,
            amounts.premium,
            amounts.income_tax,
            amounts.accounting_fee,
            amounts.invoice_excl_vat,
        ];
        if self.with_vat() {
            values.extend([amounts.vat, amounts.invoice_incl_vat]);
        }
        values.push(amounts.declaration_stamp);
        for value in values {
            write!(f, "{:>AMOUNT_WIDTH$}", format_thousands(value, 2))?;
        }
        Ok(())
    }

    fn write_month(
        &self,
        f: &mut fmt::Formatter<'_>,
        month: &MonthCalculation,
    ) -> fmt::Result {
        let marker = if month.notices.is_empty() { " " } else { "*" };
        write!(
            f,
            "{:<LABEL_WIDTH$}{:>9} {:<7}",
            format!("{}{marker}", month.label),
            opt_rate_display(Some(month.rate)),
            month.rate_provenance.as_str()
        )?;
        self.write_amounts(f, &month.amounts_in(self.display))?;
        writeln!(f, "  {}", month.bracket.number())
    }
}

fn describe_notice(
    month: &MonthCalculation,
    notice: &MonthNotice,
) -> String {
    match notice {
        MonthNotice::RateFallback {
            original,
            substituted,
        } => format!(
            "{}: rate {} unusable, calculated at {}",
            month.label,
            opt_rate_display(*original),
            opt_rate_display(Some(*substituted))
        ),
        MonthNotice::NonConvergence { worst_case } => format!(
            "{}: solver did not converge, invoice set to {} TRY",
            month.label,
            format_thousands(*worst_case, 2)
        ),
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let result = self.result;
        let totals = &result.totals;

        writeln!(
            f,
            "Net-to-gross {} | net entered in {} | amounts in {}",
            result.year, result.currency, self.display
        )?;
        writeln!(f)?;

        self.write_header(f)?;
        for month in &result.months {
            self.write_month(f, month)?;
        }

        write!(f, "{:<LABEL_WIDTH$}{:>17}", "Total", "")?;
        self.write_amounts(f, totals.totals_in(self.display))?;
        writeln!(f)?;
        write!(f, "{:<LABEL_WIDTH$}{:>17}", "Average", "")?;
        self.write_amounts(f, &totals.monthly_average(self.display))?;
        writeln!(f)?;
        writeln!(f)?;

        writeln!(
            f,
            "Cumulative taxable base: {} TRY",
            format_thousands(totals.taxable_base, 2)
        )?;
        writeln!(
            f,
            "Income tax to date:      {} TRY",
            format_thousands(totals.income_tax, 2)
        )?;
        writeln!(
            f,
            "Final bracket:           {} ({}%) {}",
            totals.final_bracket.number(),
            totals.final_bracket.marginal_rate_percent,
            totals.final_bracket.range_description
        )?;

        let notes: Vec<String> = result
            .months
            .iter()
            .flat_map(|month| {
                month
                    .notices
                    .iter()
                    .map(move |notice| describe_notice(month, notice))
            })
            .collect();
        if !notes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Notes:")?;
            for note in notes {
                writeln!(f, "  * {note}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Month;
    use netbrut_core::{
        CalculationInput, FiscalYearConfig, MonthlyRate, PremiumPolicy, RateProvenance,
        RateSeries, YearlyDriver, month_label,
    };
    use rust_decimal_macros::dec;

    use super::*;

    fn result(
        rates: &[Option<Decimal>],
        include_vat: bool,
    ) -> YearlyResult {
        let config = FiscalYearConfig::turkey_2025();
        let mut month = Month::January;
        let mut months = Vec::new();
        for rate in rates {
            months.push(MonthlyRate {
                month,
                label: month_label(month).to_string(),
                rate: *rate,
                rate_date: None,
                is_current: false,
                provenance: RateProvenance::Static,
            });
            month = month.succ();
        }
        let input = CalculationInput {
            target_net: dec!(3000),
            currency: Currency::Eur,
            start_month: Month::January,
            start_year: 2025,
            premium_policy: PremiumPolicy::discounted(&config),
            include_vat,
            manual_rate_override: None,
            current_rate: None,
        };
        YearlyDriver::new(config)
            .unwrap()
            .calculate(&input, &RateSeries::new(2025, months))
            .unwrap()
    }

    #[test]
    fn lists_every_month_and_totals() {
        let text = Report::new(&result(&[Some(dec!(40)), Some(dec!(41))], false), Currency::Try).to_string();

        assert!(text.starts_with("Net-to-gross 2025 | net entered in EUR | amounts in TRY"));
        assert!(text.contains("Ocak"));
        assert!(text.contains("Şubat"));
        assert!(text.contains("Total"));
        assert!(text.contains("Average"));
        assert!(text.contains("Final bracket:"));
        assert!(!text.contains("Notes:"));
    }

    #[test]
    fn eur_display_shows_target_net() {
        let text = Report::new(&result(&[Some(dec!(40))], false), Currency::Eur).to_string();
        let january = text
            .lines()
            .find(|line| line.starts_with("Ocak"))
            .unwrap();

        assert!(january.contains("3,000.00"), "got: {january}");
    }

    #[test]
    fn vat_columns_only_with_vat() {
        let without = Report::new(&result(&[Some(dec!(40))], false), Currency::Try).to_string();
        let with = Report::new(&result(&[Some(dec!(40))], true), Currency::Try).to_string();

        assert!(!without.contains("Invoice+VAT"));
        assert!(with.contains("Invoice+VAT"));
    }

    #[test]
    fn fallback_months_are_marked_and_noted() {
        let text = Report::new(&result(&[Some(dec!(40)), None], false), Currency::Try).to_string();

        assert!(text.contains("Şubat*"));
        assert!(text.contains("Notes:"));
        assert!(text.contains("Şubat: rate — unusable, calculated at 40.0000"));
    }

    #[test]
    fn notices_describe_non_convergence() {
        let month = &result(&[Some(dec!(40))], false).months[0];

        let text = describe_notice(month, &MonthNotice::NonConvergence { worst_case: dec!(1500000) });

        assert_eq!(text, "Ocak: solver did not converge, invoice set to 1,500,000.00 TRY");
    }
}
