//! Strategy catalog: the roster of named profiles users can copy.
//!
//! Stands in for the hosted backend's strategy collection. The roster is
//! ordered, validated on the way in, and revisions are pushed to
//! subscribers the same way the account store pushes record updates.

use anyhow::Result;
use async_trait::async_trait;
use copysim_core::{Strategy, StrategySource};
use rust_decimal_macros::dec;
use tokio::sync::{broadcast, RwLock};

const REVISION_CAPACITY: usize = 16;

/// Fixed-roster strategy source.
pub struct StaticStrategyCatalog {
    roster: RwLock<Vec<Strategy>>,
    revisions: broadcast::Sender<Vec<Strategy>>,
}

impl StaticStrategyCatalog {
    /// Builds a catalog from an ordered roster.
    ///
    /// # Errors
    /// Returns the first strategy validation failure.
    pub fn new(roster: Vec<Strategy>) -> Result<Self> {
        for strategy in &roster {
            strategy.validate()?;
        }
        let (revisions, _) = broadcast::channel(REVISION_CAPACITY);
        Ok(Self {
            roster: RwLock::new(roster),
            revisions,
        })
    }

    /// The demo roster every fresh install ships with.
    ///
    /// # Panics
    /// Never; the canned roster passes validation by construction.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(demo_strategies()).expect("demo roster is valid")
    }

    /// Swaps the roster and pushes the new revision to subscribers.
    ///
    /// # Errors
    /// Returns the first validation failure; the old roster stays in place.
    pub async fn replace(&self, roster: Vec<Strategy>) -> Result<()> {
        for strategy in &roster {
            strategy.validate()?;
        }
        let mut current = self.roster.write().await;
        *current = roster;
        let _ = self.revisions.send(current.clone());
        tracing::info!(count = current.len(), "strategy roster replaced");
        Ok(())
    }
}

#[async_trait]
impl StrategySource for StaticStrategyCatalog {
    async fn list(&self, active_only: bool) -> Result<Vec<Strategy>> {
        let roster = self.roster.read().await;
        Ok(roster
            .iter()
            .filter(|s| !active_only || s.is_active)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Strategy>> {
        let roster = self.roster.read().await;
        Ok(roster.iter().find(|s| s.id == id).cloned())
    }

    async fn subscribe(&self) -> Result<broadcast::Receiver<Vec<Strategy>>> {
        Ok(self.revisions.subscribe())
    }
}

/// The canned roster shown to every demo account.
#[must_use]
pub fn demo_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            id: "steady-growth".to_string(),
            name: "Steady Growth".to_string(),
            duration_ms: 60_000,
            min_return_pct: dec!(4),
            max_return_pct: dec!(9),
            min_investment: dec!(100),
            is_active: true,
        },
        Strategy {
            id: "momentum-surge".to_string(),
            name: "Momentum Surge".to_string(),
            duration_ms: 30_000,
            min_return_pct: dec!(12),
            max_return_pct: dec!(22),
            min_investment: dec!(500),
            is_active: true,
        },
        Strategy {
            id: "whale-watch".to_string(),
            name: "Whale Watch".to_string(),
            duration_ms: 120_000,
            min_return_pct: dec!(8),
            max_return_pct: dec!(15),
            min_investment: dec!(250),
            is_active: true,
        },
        Strategy {
            id: "overnight-scalper".to_string(),
            name: "Overnight Scalper".to_string(),
            duration_ms: 15_000,
            min_return_pct: dec!(18),
            max_return_pct: dec!(35),
            min_investment: dec!(1_000),
            is_active: true,
        },
        Strategy {
            id: "legacy-grid".to_string(),
            name: "Legacy Grid".to_string(),
            duration_ms: 90_000,
            min_return_pct: dec!(2),
            max_return_pct: dec!(5),
            min_investment: dec!(50),
            is_active: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_roster_lists_in_insertion_order() {
        let catalog = StaticStrategyCatalog::demo();
        let all = catalog.list(false).await.unwrap();

        assert_eq!(all.len(), 5);
        assert_eq!(all[0].id, "steady-growth");
        assert_eq!(all[4].id, "legacy-grid");
    }

    #[tokio::test]
    async fn active_filter_drops_retired_strategies() {
        let catalog = StaticStrategyCatalog::demo();
        let active = catalog.list(true).await.unwrap();

        assert_eq!(active.len(), 4);
        assert!(active.iter().all(|s| s.is_active));
    }

    #[tokio::test]
    async fn get_resolves_by_id() {
        let catalog = StaticStrategyCatalog::demo();

        let found = catalog.get("momentum-surge").await.unwrap();
        assert_eq!(found.unwrap().name, "Momentum Surge");

        assert!(catalog.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_pushes_the_new_roster() {
        let catalog = StaticStrategyCatalog::demo();
        let mut revisions = catalog.subscribe().await.unwrap();

        let next = vec![demo_strategies().remove(0)];
        catalog.replace(next).await.unwrap();

        let pushed = revisions.recv().await.unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(catalog.list(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_roster_is_refused() {
        let mut bad = demo_strategies();
        bad[0].duration_ms = 0;

        assert!(StaticStrategyCatalog::new(bad).is_err());
    }
}
