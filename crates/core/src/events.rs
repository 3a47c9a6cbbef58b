//! Resolution outcome types emitted by the trade lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a resolved position settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    /// Principal plus profit returned to the balance.
    Win,
    /// Principal forfeited.
    Loss,
}

/// The transient "trade result" notification the view layer shows for a
/// few seconds after a position resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    /// Id of the resolved position.
    pub position_id: Uuid,
    /// Account whose ledger was settled.
    pub account_id: String,
    /// Display name of the strategy the position ran on.
    pub strategy_name: String,
    /// Principal the position was opened with.
    pub invested: Decimal,
    /// Profit on a win; zero on a loss.
    pub profit: Decimal,
    /// Win or loss.
    pub outcome: TradeOutcome,
    /// When the resolution was applied to the ledger.
    pub resolved_at: DateTime<Utc>,
}

impl TradeResult {
    /// Amount credited back to the spendable balance by this resolution.
    #[must_use]
    pub fn credited(&self) -> Decimal {
        match self.outcome {
            TradeOutcome::Win => self.invested + self.profit,
            TradeOutcome::Loss => Decimal::ZERO,
        }
    }

    /// True when the position settled as a win.
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.outcome == TradeOutcome::Win
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn result(outcome: TradeOutcome, profit: Decimal) -> TradeResult {
        TradeResult {
            position_id: Uuid::new_v4(),
            account_id: "acct-1".to_string(),
            strategy_name: "Steady Growth".to_string(),
            invested: dec!(500),
            profit,
            outcome,
            resolved_at: Utc::now(),
        }
    }

    #[test]
    fn win_credits_principal_plus_profit() {
        let result = result(TradeOutcome::Win, dec!(110));
        assert!(result.is_win());
        assert_eq!(result.credited(), dec!(610));
    }

    #[test]
    fn loss_credits_nothing() {
        let result = result(TradeOutcome::Loss, dec!(0));
        assert!(!result.is_win());
        assert_eq!(result.credited(), dec!(0));
    }

    #[test]
    fn outcome_serializes_as_plain_variant() {
        assert_eq!(
            serde_json::to_string(&TradeOutcome::Win).unwrap(),
            r#""Win""#
        );
        assert_eq!(
            serde_json::to_string(&TradeOutcome::Loss).unwrap(),
            r#""Loss""#
        );
    }
}
