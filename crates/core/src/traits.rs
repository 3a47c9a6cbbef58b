//! Narrow contracts for the external collaborators: the account record
//! store, the strategy catalog feed, and the OCR engine.
//!
//! The simulation core depends only on these traits, never on a specific
//! backend. Push subscriptions hand out `broadcast::Receiver`s; dropping
//! the receiver is the unsubscribe.

use crate::account::{AccountDelta, AccountPatch, AccountRecord};
use crate::error::TradeError;
use crate::strategy::Strategy;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Keyed account-record store with merge writes and atomic delta
/// application.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetches the record for `account_id`, if one exists.
    async fn get(&self, account_id: &str) -> Result<Option<AccountRecord>, TradeError>;

    /// Merges `patch` into the record, creating it when absent
    /// (registration). Only present fields overwrite.
    async fn set(&self, account_id: &str, patch: AccountPatch)
        -> Result<AccountRecord, TradeError>;

    /// Applies a signed delta atomically inside the store, so concurrent
    /// resolutions can never interleave stale read-modify-write snapshots.
    ///
    /// # Errors
    /// [`TradeError::AccountNotFound`] for unknown accounts and
    /// [`TradeError::InsufficientFunds`] when the delta would overdraw.
    async fn apply(&self, account_id: &str, delta: AccountDelta)
        -> Result<AccountRecord, TradeError>;

    /// Push feed of record updates for one account.
    async fn subscribe(
        &self,
        account_id: &str,
    ) -> Result<broadcast::Receiver<AccountRecord>, TradeError>;
}

/// Read endpoint for the strategy roster.
#[async_trait]
pub trait StrategySource: Send + Sync {
    /// Returns the roster in catalog order, optionally filtered to active
    /// strategies.
    async fn list(&self, active_only: bool) -> Result<Vec<Strategy>>;

    /// Resolves a single strategy by id.
    async fn get(&self, id: &str) -> Result<Option<Strategy>>;

    /// Push feed of roster revisions.
    async fn subscribe(&self) -> Result<broadcast::Receiver<Vec<Strategy>>>;
}

/// Black-box text extraction from an uploaded image.
///
/// Any OCR engine (or a canned stub) can sit behind this; the receipt
/// classifier is specified purely in terms of the text it gets back.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Extracts raw text from the image bytes. May fail; the caller owns
    /// the failure.
    async fn recognize_text(&self, image: &[u8], mime: &str) -> Result<String>;
}
