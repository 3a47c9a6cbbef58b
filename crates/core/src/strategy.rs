//! Strategy records: the named profiles users "copy".
//!
//! A strategy defines how long a simulated position runs and the return
//! range it settles inside. Positions capture a copy at open time, so a
//! catalog update never changes a position already in flight.

use crate::error::TradeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named trading profile offered by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Stable identifier used by the UI and the session commands.
    pub id: String,
    /// Display name (e.g. "Momentum Surge").
    pub name: String,
    /// How long a position on this strategy runs, in milliseconds.
    pub duration_ms: u64,
    /// Lower bound of the settled return range, in percent.
    pub min_return_pct: Decimal,
    /// Upper bound of the settled return range, in percent.
    pub max_return_pct: Decimal,
    /// Smallest amount the strategy accepts.
    pub min_investment: Decimal,
    /// Inactive strategies are listed but refuse deployments.
    pub is_active: bool,
}

impl Strategy {
    /// Checks the field invariants: positive duration, ordered return
    /// range, non-negative minimum investment.
    ///
    /// # Errors
    /// Returns [`TradeError::InvalidStrategy`] naming the violated invariant.
    pub fn validate(&self) -> Result<(), TradeError> {
        if self.duration_ms == 0 {
            return Err(TradeError::invalid_strategy(
                &self.name,
                "duration must be positive",
            ));
        }
        if self.min_return_pct > self.max_return_pct {
            return Err(TradeError::invalid_strategy(
                &self.name,
                "return range is inverted",
            ));
        }
        if self.min_investment < Decimal::ZERO {
            return Err(TradeError::invalid_strategy(
                &self.name,
                "minimum investment is negative",
            ));
        }
        Ok(())
    }

    /// Position duration as a `chrono` duration.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.duration_ms).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_strategy() -> Strategy {
        Strategy {
            id: "steady".to_string(),
            name: "Steady Growth".to_string(),
            duration_ms: 60_000,
            min_return_pct: dec!(5),
            max_return_pct: dec!(12),
            min_investment: dec!(100),
            is_active: true,
        }
    }

    #[test]
    fn valid_strategy_passes() {
        assert!(base_strategy().validate().is_ok());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut strategy = base_strategy();
        strategy.duration_ms = 0;

        let err = strategy.validate().unwrap_err();
        assert!(err.to_string().contains("duration"));
    }

    #[test]
    fn inverted_return_range_is_rejected() {
        let mut strategy = base_strategy();
        strategy.min_return_pct = dec!(20);
        strategy.max_return_pct = dec!(10);

        assert!(strategy.validate().is_err());
    }

    #[test]
    fn equal_return_bounds_are_allowed() {
        let mut strategy = base_strategy();
        strategy.min_return_pct = dec!(10);
        strategy.max_return_pct = dec!(10);

        assert!(strategy.validate().is_ok());
    }

    #[test]
    fn negative_minimum_investment_is_rejected() {
        let mut strategy = base_strategy();
        strategy.min_investment = dec!(-1);

        assert!(strategy.validate().is_err());
    }

    #[test]
    fn duration_converts_to_chrono() {
        let strategy = base_strategy();
        assert_eq!(strategy.duration(), chrono::Duration::seconds(60));
    }
}
