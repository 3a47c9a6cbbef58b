//! Running positions: in-flight simulated trades and their state machine.

use crate::events::TradeOutcome;
use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a running position.
///
/// `Pending → Resolving → Resolved`, never skipping and never re-entering
/// `Resolving`. The tick loop can observe a due position more than once
/// before removal completes, so the transition out of `Pending` is the
/// single point where the outcome is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    /// Progress below 100%, still accruing.
    Pending,
    /// Progress reached 100%; settlement drawn but not yet persisted.
    Resolving,
    /// Settlement applied to the ledger; the position leaves the active set.
    Resolved,
}

/// The settlement drawn when a position comes due.
///
/// Pinned on the position before the ledger write, so a retried write
/// applies the same outcome instead of re-drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Win or loss.
    pub outcome: TradeOutcome,
    /// Profit on a win; zero on a loss.
    pub profit: Decimal,
}

/// An in-progress simulated trade tied to one strategy and one amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningPosition {
    /// Unique per position.
    pub id: Uuid,
    /// Captured copy of the strategy; catalog updates never reach it.
    pub strategy: Strategy,
    /// Principal locked while the position runs.
    pub invested_amount: Decimal,
    /// When the position opened.
    pub opened_at: DateTime<Utc>,
    /// 0–100, monotonically non-decreasing until resolution.
    pub progress_pct: f64,
    /// Cosmetic running P&L estimate; re-drawn every tick.
    pub estimated_pnl: Decimal,
    /// Current lifecycle state.
    pub state: PositionState,
    /// Drawn settlement, present from `Resolving` onward.
    pub settlement: Option<Settlement>,
}

impl RunningPosition {
    /// Opens a position on a captured strategy copy.
    #[must_use]
    pub fn open(strategy: Strategy, invested_amount: Decimal, opened_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy,
            invested_amount,
            opened_at,
            progress_pct: 0.0,
            estimated_pnl: Decimal::ZERO,
            state: PositionState::Pending,
            settlement: None,
        }
    }

    /// Elapsed share of the strategy duration, clamped to `[0, 100]`.
    #[must_use]
    pub fn raw_progress(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_ms = (now - self.opened_at).num_milliseconds();
        if elapsed_ms <= 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = elapsed_ms as f64 / self.strategy.duration_ms as f64;
        (ratio * 100.0).clamp(0.0, 100.0)
    }

    /// True once the full strategy duration has elapsed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.raw_progress(now) >= 100.0
    }

    /// True once the settlement has been applied to the ledger.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state == PositionState::Resolved
    }
}
