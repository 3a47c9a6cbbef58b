use crate::commands::SessionCommand;
use crate::events::{SessionEvent, SessionStatus};
use anyhow::Result;
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use uuid::Uuid;

/// Cloneable façade over a session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    status_rx: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    #[must_use]
    pub(crate) fn new(
        tx: mpsc::Sender<SessionCommand>,
        event_tx: broadcast::Sender<SessionEvent>,
        status_rx: watch::Receiver<SessionStatus>,
    ) -> Self {
        Self {
            tx,
            event_tx,
            status_rx,
        }
    }

    /// Deploys `amount` onto a catalog strategy and returns the position id.
    ///
    /// # Errors
    /// The underlying [`copysim_core::TradeError`] when a precondition
    /// fails (downcast it to branch on `InsufficientFunds` for the deposit
    /// prompt), or a channel error when the session is gone.
    pub async fn open_position(&self, strategy_id: &str, amount: Decimal) -> Result<Uuid> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::OpenPosition {
                strategy_id: strategy_id.to_string(),
                amount,
                reply,
            })
            .await?;
        let id = rx.await??;
        Ok(id)
    }

    /// Submits a payment screenshot for classification. The verdict comes
    /// back as a [`SessionEvent`].
    ///
    /// # Errors
    /// Returns an error if the session is gone.
    pub async fn submit_receipt(&self, image: Vec<u8>, mime: impl Into<String>) -> Result<()> {
        self.tx
            .send(SessionCommand::SubmitReceipt {
                image,
                mime: mime.into(),
            })
            .await?;
        Ok(())
    }

    /// Fetches a fresh status snapshot from the actor.
    ///
    /// # Errors
    /// Returns an error if the session is gone.
    pub async fn status(&self) -> Result<SessionStatus> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(SessionCommand::GetStatus(reply)).await?;
        let status = rx.await?;
        Ok(status)
    }

    /// The most recently published status, without a round trip.
    #[must_use]
    pub fn latest_status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    /// Subscribes to the session event stream.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Stops the session actor.
    ///
    /// # Errors
    /// Returns an error if the session is already gone.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(SessionCommand::Shutdown).await?;
        Ok(())
    }
}
