//! The simulated trade lifecycle: open a position against the ledger,
//! advance it on a tick, settle it exactly once.
//!
//! Nothing here touches a market. Fills, returns, and outcomes are drawn
//! from the injected [`RandomSource`]; the only I/O is delta writes to the
//! account store.

use crate::rng::RandomSource;
use anyhow::Result;
use chrono::{DateTime, Utc};
use copysim_core::{
    AccountDelta, AccountStore, PositionState, RunningPosition, Settlement, SimulationConfig,
    Strategy, TradeError, TradeOutcome, TradeResult,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Per-account controller for the active position set.
///
/// Single-threaded by design: one session drives one lifecycle from one
/// task, and every ledger mutation is a delta the store applies atomically.
pub struct TradeLifecycle {
    account_id: String,
    store: Arc<dyn AccountStore>,
    rng: Box<dyn RandomSource>,
    config: SimulationConfig,
    active: HashMap<Uuid, RunningPosition>,
}

impl TradeLifecycle {
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        store: Arc<dyn AccountStore>,
        rng: Box<dyn RandomSource>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            store,
            rng,
            config,
            active: HashMap::new(),
        }
    }

    /// Opens a position: debits the principal, locks it in
    /// `total_invested`, and registers a `Pending` position at 0%.
    ///
    /// # Errors
    /// [`TradeError::StrategyInactive`], [`TradeError::BelowMinimum`], or
    /// [`TradeError::InsufficientFunds`] when the preconditions fail; the
    /// ledger is untouched on every error path.
    pub async fn open(
        &mut self,
        strategy: &Strategy,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Uuid, TradeError> {
        if !strategy.is_active {
            return Err(TradeError::StrategyInactive {
                name: strategy.name.clone(),
            });
        }
        if amount < strategy.min_investment {
            return Err(TradeError::below_minimum(strategy.min_investment, amount));
        }

        let account = self
            .store
            .get(&self.account_id)
            .await?
            .ok_or_else(|| TradeError::account_not_found(&self.account_id))?;
        if account.balance < amount {
            return Err(TradeError::insufficient_funds(amount, account.balance));
        }

        self.store
            .apply(&self.account_id, AccountDelta::open(amount))
            .await?;

        let position = RunningPosition::open(strategy.clone(), amount, now);
        let id = position.id;
        tracing::info!(
            account_id = %self.account_id,
            position_id = %id,
            strategy = %strategy.name,
            %amount,
            "position opened"
        );
        self.active.insert(id, position);
        Ok(id)
    }

    /// Advances every active position to `now` and settles the ones that
    /// came due. Returns the settlements applied this tick.
    ///
    /// Progress is monotone and clamped to `[0, 100]`; the running P&L
    /// estimate is re-drawn every tick (the flicker is the feature). A
    /// position whose duration has elapsed transitions `Pending →
    /// Resolving` exactly once, at which point its outcome is drawn and
    /// pinned; the ledger write then retires it. Extra ticks after a
    /// position resolved never touch the ledger again.
    ///
    /// # Errors
    /// Only on internal invariant violations; a failed settlement write is
    /// not an error — the position stays parked in `Resolving` and the
    /// same pinned settlement is retried next tick.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<Vec<TradeResult>> {
        let win_probability = self.config.win_probability;

        for position in self.active.values_mut() {
            if position.state != PositionState::Pending {
                continue;
            }
            let raw = position.raw_progress(now);
            position.progress_pct = position.progress_pct.max(raw);
            if raw < 100.0 {
                position.estimated_pnl = estimate_pnl(position, self.rng.as_mut());
            } else {
                position.progress_pct = 100.0;
                position.state = PositionState::Resolving;
                position.settlement =
                    Some(draw_settlement(position, self.rng.as_mut(), win_probability));
            }
        }

        let due: Vec<Uuid> = self
            .active
            .iter()
            .filter(|(_, p)| p.state == PositionState::Resolving)
            .map(|(id, _)| *id)
            .collect();

        let mut results = Vec::new();
        for id in due {
            let Some(position) = self.active.get(&id) else {
                continue;
            };
            let Some(settlement) = position.settlement else {
                continue;
            };
            let invested = position.invested_amount;
            let strategy_name = position.strategy.name.clone();
            let delta = match settlement.outcome {
                TradeOutcome::Win => AccountDelta::win(invested, settlement.profit),
                TradeOutcome::Loss => AccountDelta::loss(invested),
            };

            match self.store.apply(&self.account_id, delta).await {
                Ok(_) => {
                    if let Some(mut retired) = self.active.remove(&id) {
                        retired.state = PositionState::Resolved;
                    }
                    tracing::info!(
                        account_id = %self.account_id,
                        position_id = %id,
                        outcome = ?settlement.outcome,
                        profit = %settlement.profit,
                        "position resolved"
                    );
                    results.push(TradeResult {
                        position_id: id,
                        account_id: self.account_id.clone(),
                        strategy_name,
                        invested,
                        profit: settlement.profit,
                        outcome: settlement.outcome,
                        resolved_at: now,
                    });
                }
                Err(err) => {
                    // Parked in Resolving with its pinned settlement; the
                    // next tick retries the same delta, so the ledger can
                    // never be credited twice or with a re-drawn outcome.
                    tracing::warn!(
                        account_id = %self.account_id,
                        position_id = %id,
                        %err,
                        "settlement write failed, retrying next tick"
                    );
                }
            }
        }

        Ok(results)
    }

    /// Active positions, oldest first.
    #[must_use]
    pub fn active_positions(&self) -> Vec<&RunningPosition> {
        let mut positions: Vec<&RunningPosition> = self.active.values().collect();
        positions.sort_by_key(|p| p.opened_at);
        positions
    }

    #[must_use]
    pub fn position(&self, id: Uuid) -> Option<&RunningPosition> {
        self.active.get(&id)
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

fn return_range(strategy: &Strategy) -> (f64, f64) {
    let lo = strategy.min_return_pct.to_f64().unwrap_or(0.0);
    let hi = strategy.max_return_pct.to_f64().unwrap_or(lo);
    (lo, hi)
}

fn estimate_pnl(position: &RunningPosition, rng: &mut dyn RandomSource) -> Decimal {
    let (lo, hi) = return_range(&position.strategy);
    let invested = position.invested_amount.to_f64().unwrap_or(0.0);
    let value = invested * rng.uniform(lo, hi) / 100.0 * position.progress_pct / 100.0;
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).round_dp(4)
}

fn draw_settlement(
    position: &RunningPosition,
    rng: &mut dyn RandomSource,
    win_probability: f64,
) -> Settlement {
    if rng.draw() < win_probability {
        let (lo, hi) = return_range(&position.strategy);
        let invested = position.invested_amount.to_f64().unwrap_or(0.0);
        let profit = invested * rng.uniform(lo, hi) / 100.0;
        Settlement {
            outcome: TradeOutcome::Win,
            profit: Decimal::from_f64(profit)
                .unwrap_or(Decimal::ZERO)
                .round_dp(2),
        }
    } else {
        Settlement {
            outcome: TradeOutcome::Loss,
            profit: Decimal::ZERO,
        }
    }
}
