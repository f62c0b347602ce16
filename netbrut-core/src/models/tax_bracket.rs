use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One segment of the progressive income tax tariff.
///
/// `base_tax` is the cumulative tax owed at `lower_bound`; an `upper_bound`
/// of `None` marks the open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub marginal_rate: Decimal,
    pub base_tax: Decimal,
}

impl TaxBracket {
    /// Whether `base` falls at or below this bracket's upper bound.
    pub fn covers(
        &self,
        base: Decimal,
    ) -> bool {
        self.upper_bound.is_none_or(|upper| base <= upper)
    }
}

/// Display/reporting classification of a cumulative base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketClass {
    /// Zero-based position in the tariff.
    pub index: usize,
    /// Marginal rate as a percentage, e.g. `27` for 27%.
    pub marginal_rate_percent: Decimal,
    pub range_description: String,
}

impl BracketClass {
    /// One-based bracket number as printed on tariff tables.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}
