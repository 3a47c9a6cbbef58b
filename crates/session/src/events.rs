use chrono::{DateTime, Utc};
use copysim_core::{AccountRecord, RunningPosition, TradeResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events streamed to session subscribers (the view layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A position opened and its principal was locked.
    PositionOpened {
        position_id: Uuid,
        strategy_name: String,
        invested: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// Per-tick progress and flickering P&L estimate for one position.
    ProgressUpdate {
        position_id: Uuid,
        progress_pct: f64,
        estimated_pnl: Decimal,
    },

    /// A position settled and the ledger was credited.
    TradeResolved(TradeResult),

    /// A screenshot passed the classifier with a concrete amount; the
    /// account was credited.
    DepositVerified {
        amount: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// A screenshot passed the classifier but carried no readable amount;
    /// nothing was credited.
    DepositUnderReview {
        summary: String,
        timestamp: DateTime<Utc>,
    },

    /// A screenshot was turned away.
    DepositRejected {
        summary: String,
        timestamp: DateTime<Utc>,
    },

    /// The account record changed.
    AccountUpdated(AccountRecord),

    /// Something inside the session failed; the session keeps running.
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

/// Snapshot of one session, published on the status watch channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub account_id: String,
    pub account: AccountRecord,
    /// Open positions, oldest first.
    pub open_positions: Vec<PositionInfo>,
    /// The transient result banner; cleared a few seconds after a
    /// resolution.
    pub last_result: Option<TradeResult>,
    pub updated_at: DateTime<Utc>,
}

/// View-facing summary of one running position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionInfo {
    pub position_id: Uuid,
    pub strategy_id: String,
    pub strategy_name: String,
    pub invested_amount: Decimal,
    pub progress_pct: f64,
    pub estimated_pnl: Decimal,
    pub opened_at: DateTime<Utc>,
}

impl From<&RunningPosition> for PositionInfo {
    fn from(position: &RunningPosition) -> Self {
        Self {
            position_id: position.id,
            strategy_id: position.strategy.id.clone(),
            strategy_name: position.strategy.name.clone(),
            invested_amount: position.invested_amount,
            progress_pct: position.progress_pct,
            estimated_pnl: position.estimated_pnl,
            opened_at: position.opened_at,
        }
    }
}
