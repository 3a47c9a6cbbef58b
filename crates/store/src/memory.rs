//! In-memory implementation of the account record store.
//!
//! Stands in for the hosted document-database backend: a keyed record map
//! with merge writes, atomic delta application, and per-account push
//! subscriptions. The whole lifecycle is explicit — construct one per
//! session or test, drop it to tear down — so nothing hides in a global.

use async_trait::async_trait;
use copysim_core::{AccountDelta, AccountPatch, AccountRecord, AccountStore, TradeError};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

const SUBSCRIBER_CAPACITY: usize = 64;

struct AccountEntry {
    record: AccountRecord,
    updates: broadcast::Sender<AccountRecord>,
}

impl AccountEntry {
    fn new(record: AccountRecord) -> Self {
        let (updates, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self { record, updates }
    }

    fn publish(&self) {
        // No receivers is fine; the send result is deliberately ignored.
        let _ = self.updates.send(self.record.clone());
    }
}

/// Keyed in-memory account store.
///
/// `apply` performs its read-modify-write entirely under the write lock,
/// so two resolutions landing "at once" serialize instead of clobbering
/// each other with stale snapshots.
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, AccountEntry>>,
}

impl InMemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Number of registered accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// True when no account has been registered yet.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, account_id: &str) -> Result<Option<AccountRecord>, TradeError> {
        Ok(self
            .accounts
            .read()
            .await
            .get(account_id)
            .map(|entry| entry.record.clone()))
    }

    async fn set(
        &self,
        account_id: &str,
        patch: AccountPatch,
    ) -> Result<AccountRecord, TradeError> {
        let mut accounts = self.accounts.write().await;
        let entry = accounts
            .entry(account_id.to_string())
            .or_insert_with(|| AccountEntry::new(AccountRecord::default()));

        entry.record.merge(&patch);
        entry.publish();
        Ok(entry.record.clone())
    }

    async fn apply(
        &self,
        account_id: &str,
        delta: AccountDelta,
    ) -> Result<AccountRecord, TradeError> {
        let mut accounts = self.accounts.write().await;
        let entry = accounts
            .get_mut(account_id)
            .ok_or_else(|| TradeError::account_not_found(account_id))?;

        entry.record = entry.record.apply(&delta)?;
        entry.publish();

        tracing::debug!(
            account_id,
            balance = %entry.record.balance,
            total_invested = %entry.record.total_invested,
            "applied ledger delta"
        );
        Ok(entry.record.clone())
    }

    async fn subscribe(
        &self,
        account_id: &str,
    ) -> Result<broadcast::Receiver<AccountRecord>, TradeError> {
        self.accounts
            .read()
            .await
            .get(account_id)
            .map(|entry| entry.updates.subscribe())
            .ok_or_else(|| TradeError::account_not_found(account_id))
    }
}
