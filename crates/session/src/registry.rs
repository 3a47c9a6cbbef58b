use crate::actor::SessionActor;
use crate::events::SessionStatus;
use crate::handle::SessionHandle;
use anyhow::Result;
use copysim_core::{AccountPatch, AccountStore, AppConfig, StrategySource};
use copysim_engine::{Clock, OsRandom, RandomSource, SystemClock};
use copysim_receipt::ReceiptClassifier;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, RwLock};

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 256;

/// Spawns and tracks one session actor per account.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    store: Arc<dyn AccountStore>,
    catalog: Arc<dyn StrategySource>,
    classifier: Arc<ReceiptClassifier>,
    config: AppConfig,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        catalog: Arc<dyn StrategySource>,
        classifier: Arc<ReceiptClassifier>,
        config: AppConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            store,
            catalog,
            classifier,
            config,
        }
    }

    /// Spawns a session on the wall clock and OS randomness.
    ///
    /// # Errors
    /// Returns an error if account registration fails.
    pub async fn spawn_session(&self, account_id: &str) -> Result<SessionHandle> {
        self.spawn_session_with(account_id, Arc::new(SystemClock), Box::new(OsRandom))
            .await
    }

    /// Spawns a session with injected time and randomness, for
    /// deterministic tests.
    ///
    /// # Errors
    /// Returns an error if account registration fails.
    pub async fn spawn_session_with(
        &self,
        account_id: &str,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Result<SessionHandle> {
        // Registration: first contact creates the record with the
        // configured starting balance.
        if self.store.get(account_id).await?.is_none() {
            self.store
                .set(
                    account_id,
                    AccountPatch::with_balance(self.config.session.starting_balance),
                )
                .await?;
            tracing::info!(
                account_id,
                starting_balance = %self.config.session.starting_balance,
                "registered account"
            );
        }
        let account = self.store.get(account_id).await?.unwrap_or_default();

        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let initial_status = SessionStatus {
            account_id: account_id.to_string(),
            account,
            open_positions: Vec::new(),
            last_result: None,
            updated_at: clock.now(),
        };
        let (status_tx, status_rx) = watch::channel(initial_status);

        let handle = SessionHandle::new(tx, event_tx.clone(), status_rx);

        let actor = SessionActor::new(
            account_id,
            Arc::clone(&self.store),
            Arc::clone(&self.catalog),
            Arc::clone(&self.classifier),
            clock,
            rng,
            self.config.clone(),
            rx,
            event_tx,
            status_tx,
        );
        let spawned_for = account_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = actor.run().await {
                tracing::error!(account_id = %spawned_for, %err, "session error");
            }
        });

        self.sessions
            .write()
            .await
            .insert(account_id.to_string(), handle.clone());

        Ok(handle)
    }

    /// Handle to a running session, if any.
    #[must_use]
    pub async fn get_session(&self, account_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(account_id).cloned()
    }

    /// Shuts down and forgets one session.
    ///
    /// # Errors
    /// Returns an error if the shutdown command cannot be delivered.
    pub async fn remove_session(&self, account_id: &str) -> Result<()> {
        let removed = self.sessions.write().await.remove(account_id);
        if let Some(handle) = removed {
            handle.shutdown().await?;
            tracing::info!(account_id, "session removed");
        }
        Ok(())
    }

    /// Account ids with a running session.
    #[must_use]
    pub async fn list_sessions(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Shuts down every session in the registry.
    ///
    /// # Errors
    /// Returns the first shutdown delivery failure.
    pub async fn shutdown_all(&self) -> Result<()> {
        let handles: Vec<_> = self.sessions.read().await.values().cloned().collect();
        for handle in handles {
            handle.shutdown().await?;
        }
        self.sessions.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copysim_catalog::StaticStrategyCatalog;
    use copysim_receipt::StubRecognizer;
    use copysim_store::InMemoryAccountStore;
    use rust_decimal_macros::dec;

    fn registry() -> SessionRegistry {
        let store: Arc<dyn AccountStore> = Arc::new(InMemoryAccountStore::new());
        let catalog: Arc<dyn StrategySource> = Arc::new(StaticStrategyCatalog::demo());
        let classifier = Arc::new(ReceiptClassifier::new(Arc::new(StubRecognizer::new(""))));
        SessionRegistry::new(store, catalog, classifier, AppConfig::default())
    }

    #[tokio::test]
    async fn spawn_registers_the_account_with_starting_balance() {
        let registry = registry();
        let handle = registry.spawn_session("acct-1").await.unwrap();

        let status = handle.status().await.unwrap();
        assert_eq!(status.account_id, "acct-1");
        assert_eq!(status.account.balance, dec!(10000));
        assert!(status.open_positions.is_empty());
    }

    #[tokio::test]
    async fn sessions_are_listed_and_removable() {
        let registry = registry();
        registry.spawn_session("acct-1").await.unwrap();
        registry.spawn_session("acct-2").await.unwrap();

        let mut listed = registry.list_sessions().await;
        listed.sort();
        assert_eq!(listed, vec!["acct-1", "acct-2"]);

        registry.remove_session("acct-1").await.unwrap();
        assert!(registry.get_session("acct-1").await.is_none());
        assert!(registry.get_session("acct-2").await.is_some());
    }

    #[tokio::test]
    async fn shutdown_all_clears_the_registry() {
        let registry = registry();
        registry.spawn_session("acct-1").await.unwrap();
        registry.spawn_session("acct-2").await.unwrap();

        registry.shutdown_all().await.unwrap();
        assert!(registry.list_sessions().await.is_empty());
    }
}
