//! The session actor: one account, one simulation loop.
//!
//! Commands come in over mpsc, events fan out over broadcast, and a watch
//! channel carries the latest status snapshot. The engine tick runs on a
//! timer whose period is config smoothness only; correctness lives in the
//! engine and the store.

use crate::commands::SessionCommand;
use crate::events::{PositionInfo, SessionEvent, SessionStatus};
use anyhow::Result;
use chrono::Duration as ChronoDuration;
use copysim_core::{
    AccountDelta, AccountStore, AppConfig, StrategySource, TradeError, TradeResult,
};
use copysim_engine::{Clock, RandomSource, TradeLifecycle};
use copysim_receipt::{Classification, ReceiptClassifier};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

pub struct SessionActor {
    account_id: String,
    engine: TradeLifecycle,
    classifier: Arc<ReceiptClassifier>,
    store: Arc<dyn AccountStore>,
    catalog: Arc<dyn StrategySource>,
    clock: Arc<dyn Clock>,
    config: AppConfig,
    rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    status_tx: watch::Sender<SessionStatus>,
    last_result: Option<TradeResult>,
    banner_expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl SessionActor {
    /// Creates a session actor wired to the given collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: impl Into<String>,
        store: Arc<dyn AccountStore>,
        catalog: Arc<dyn StrategySource>,
        classifier: Arc<ReceiptClassifier>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
        config: AppConfig,
        rx: mpsc::Receiver<SessionCommand>,
        event_tx: broadcast::Sender<SessionEvent>,
        status_tx: watch::Sender<SessionStatus>,
    ) -> Self {
        let account_id = account_id.into();
        let engine = TradeLifecycle::new(
            account_id.clone(),
            Arc::clone(&store),
            rng,
            config.simulation.clone(),
        );
        Self {
            account_id,
            engine,
            classifier,
            store,
            catalog,
            clock,
            config,
            rx,
            event_tx,
            status_tx,
            last_result: None,
            banner_expires_at: None,
        }
    }

    /// Runs the session loop until shutdown or until every handle is gone.
    ///
    /// # Errors
    /// Never in practice; failures inside the loop become `Error` events.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(account_id = %self.account_id, "session starting");

        let period = std::time::Duration::from_millis(self.config.simulation.tick_interval_ms.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Finished OCR classifications land here. Holding the sender side
        // here keeps the channel open; spawned tasks get clones.
        let (verdict_tx, mut verdict_rx) = mpsc::channel::<Classification>(8);

        loop {
            tokio::select! {
                maybe_cmd = self.rx.recv() => {
                    match maybe_cmd {
                        None | Some(SessionCommand::Shutdown) => break,
                        Some(cmd) => self.handle_command(cmd, &verdict_tx).await,
                    }
                }
                _ = ticker.tick() => {
                    self.on_tick().await;
                }
                Some(verdict) = verdict_rx.recv() => {
                    self.on_verdict(verdict).await;
                }
            }
        }

        tracing::info!(account_id = %self.account_id, "session stopped");
        Ok(())
    }

    async fn handle_command(
        &mut self,
        cmd: SessionCommand,
        verdict_tx: &mpsc::Sender<Classification>,
    ) {
        match cmd {
            SessionCommand::OpenPosition {
                strategy_id,
                amount,
                reply,
            } => {
                let result = self.open_position(&strategy_id, amount).await;
                let _ = reply.send(result);
            }
            SessionCommand::SubmitReceipt { image, mime } => {
                let classifier = Arc::clone(&self.classifier);
                let tx = verdict_tx.clone();
                tokio::spawn(async move {
                    let verdict = classifier.classify(&image, &mime).await;
                    // If the session shut down while OCR ran, the channel
                    // is gone and the verdict is discarded — never applied
                    // to a stale account.
                    let _ = tx.send(verdict).await;
                });
            }
            SessionCommand::GetStatus(reply) => {
                let _ = reply.send(self.snapshot().await);
            }
            SessionCommand::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    async fn open_position(
        &mut self,
        strategy_id: &str,
        amount: Decimal,
    ) -> Result<Uuid, TradeError> {
        let strategy = self
            .catalog
            .get(strategy_id)
            .await
            .map_err(TradeError::store)?
            .ok_or_else(|| TradeError::unknown_strategy(strategy_id))?;

        let now = self.clock.now();
        let id = self.engine.open(&strategy, amount, now).await?;

        self.emit(SessionEvent::PositionOpened {
            position_id: id,
            strategy_name: strategy.name,
            invested: amount,
            timestamp: now,
        });
        self.emit_account_update().await;
        self.publish_status().await;
        Ok(id)
    }

    async fn on_tick(&mut self) {
        let now = self.clock.now();

        match self.engine.tick(now).await {
            Ok(results) => {
                let resolved_any = !results.is_empty();
                for result in results {
                    self.last_result = Some(result.clone());
                    self.banner_expires_at = Some(
                        now + ChronoDuration::milliseconds(
                            i64::try_from(self.config.simulation.result_banner_ms)
                                .unwrap_or(i64::MAX),
                        ),
                    );
                    self.emit(SessionEvent::TradeResolved(result));
                }
                if resolved_any {
                    self.emit_account_update().await;
                }
            }
            Err(err) => {
                tracing::error!(account_id = %self.account_id, %err, "tick failed");
                self.emit(SessionEvent::Error {
                    message: format!("tick failed: {err}"),
                    timestamp: now,
                });
            }
        }

        for position in self.engine.active_positions() {
            self.emit(SessionEvent::ProgressUpdate {
                position_id: position.id,
                progress_pct: position.progress_pct,
                estimated_pnl: position.estimated_pnl,
            });
        }

        // The result banner is transient; let it lapse.
        if let Some(expires_at) = self.banner_expires_at {
            if now >= expires_at {
                self.last_result = None;
                self.banner_expires_at = None;
            }
        }

        self.publish_status().await;
    }

    async fn on_verdict(&mut self, verdict: Classification) {
        let now = self.clock.now();

        if verdict.credits_account() {
            match self
                .store
                .apply(&self.account_id, AccountDelta::deposit(verdict.detected_amount))
                .await
            {
                Ok(record) => {
                    tracing::info!(
                        account_id = %self.account_id,
                        amount = %verdict.detected_amount,
                        "deposit verified"
                    );
                    self.emit(SessionEvent::DepositVerified {
                        amount: verdict.detected_amount,
                        timestamp: now,
                    });
                    self.emit(SessionEvent::AccountUpdated(record));
                }
                Err(err) => {
                    tracing::error!(account_id = %self.account_id, %err, "deposit credit failed");
                    self.emit(SessionEvent::Error {
                        message: format!("deposit credit failed: {err}"),
                        timestamp: now,
                    });
                }
            }
        } else if verdict.is_valid {
            self.emit(SessionEvent::DepositUnderReview {
                summary: verdict.summary,
                timestamp: now,
            });
        } else {
            self.emit(SessionEvent::DepositRejected {
                summary: verdict.summary,
                timestamp: now,
            });
        }

        self.publish_status().await;
    }

    async fn emit_account_update(&self) {
        if let Ok(Some(record)) = self.store.get(&self.account_id).await {
            self.emit(SessionEvent::AccountUpdated(record));
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    async fn snapshot(&self) -> SessionStatus {
        let account = self
            .store
            .get(&self.account_id)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();

        SessionStatus {
            account_id: self.account_id.clone(),
            account,
            open_positions: self
                .engine
                .active_positions()
                .into_iter()
                .map(PositionInfo::from)
                .collect(),
            last_result: self.last_result.clone(),
            updated_at: self.clock.now(),
        }
    }

    async fn publish_status(&self) {
        let _ = self.status_tx.send(self.snapshot().await);
    }
}
