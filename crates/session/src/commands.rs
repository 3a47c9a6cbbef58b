use crate::events::SessionStatus;
use copysim_core::TradeError;
use rust_decimal::Decimal;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Commands accepted by a session actor.
#[derive(Debug)]
pub enum SessionCommand {
    /// Deploy an amount onto a catalog strategy. The reply carries the new
    /// position id, or the precondition failure for the UI to act on
    /// (insufficient funds routes to the deposit flow).
    OpenPosition {
        strategy_id: String,
        amount: Decimal,
        reply: oneshot::Sender<Result<Uuid, TradeError>>,
    },
    /// Run an uploaded payment screenshot through the receipt classifier.
    /// Fire-and-forget; the verdict arrives as a session event.
    SubmitReceipt { image: Vec<u8>, mime: String },
    /// Snapshot the current session state.
    GetStatus(oneshot::Sender<SessionStatus>),
    /// Stop the actor. In-flight OCR results are discarded, never applied
    /// to a stale account.
    Shutdown,
}
