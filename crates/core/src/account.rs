//! The per-user account ledger: spendable balance, locked investment total,
//! and win/loss counters.
//!
//! All mutation goes through [`AccountDelta`], a signed adjustment applied
//! atomically by the persistence layer. Partial overwrites (registration,
//! profile-style updates) use [`AccountPatch`] with merge semantics.

use crate::error::TradeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The persisted per-user ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Spendable funds. Never negative.
    pub balance: Decimal,
    /// Sum currently locked in running positions. Never negative.
    pub total_invested: Decimal,
    /// Number of positions resolved as wins.
    pub wins: u32,
    /// Number of positions resolved as losses.
    pub losses: u32,
    /// Set once the first verified deposit lands; gates certain flows.
    pub has_deposited: bool,
}

impl AccountRecord {
    /// Creates a fresh record with the given spendable balance.
    #[must_use]
    pub fn with_balance(balance: Decimal) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Overwrites the fields present in `patch`, leaving the rest untouched.
    pub fn merge(&mut self, patch: &AccountPatch) {
        if let Some(balance) = patch.balance {
            self.balance = balance;
        }
        if let Some(total_invested) = patch.total_invested {
            self.total_invested = total_invested;
        }
        if let Some(wins) = patch.wins {
            self.wins = wins;
        }
        if let Some(losses) = patch.losses {
            self.losses = losses;
        }
        if let Some(has_deposited) = patch.has_deposited {
            self.has_deposited = has_deposited;
        }
    }

    /// Applies a signed delta, returning the adjusted record.
    ///
    /// `total_invested` is clamped at zero; a delta that would drive
    /// `balance` negative is rejected and nothing changes.
    ///
    /// # Errors
    /// Returns [`TradeError::InsufficientFunds`] when the balance adjustment
    /// cannot be covered.
    pub fn apply(&self, delta: &AccountDelta) -> Result<Self, TradeError> {
        let balance = self.balance + delta.balance;
        if balance < Decimal::ZERO {
            return Err(TradeError::insufficient_funds(-delta.balance, self.balance));
        }

        let total_invested = (self.total_invested + delta.total_invested).max(Decimal::ZERO);

        Ok(Self {
            balance,
            total_invested,
            wins: self.wins + delta.wins,
            losses: self.losses + delta.losses,
            has_deposited: delta.has_deposited.unwrap_or(self.has_deposited),
        })
    }
}

/// Partial account record with merge semantics: only present fields
/// overwrite on [`AccountRecord::merge`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountPatch {
    pub balance: Option<Decimal>,
    pub total_invested: Option<Decimal>,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub has_deposited: Option<bool>,
}

impl AccountPatch {
    /// Patch that only sets the spendable balance.
    #[must_use]
    pub fn with_balance(balance: Decimal) -> Self {
        Self {
            balance: Some(balance),
            ..Self::default()
        }
    }
}

/// A signed ledger adjustment, applied atomically by the store.
///
/// The four mutation shapes of the simulation (open, win, loss, deposit)
/// each have a constructor, so arithmetic lives in one place and callers
/// never read-modify-write a cached record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountDelta {
    /// Signed adjustment to the spendable balance.
    pub balance: Decimal,
    /// Signed adjustment to the locked investment total.
    pub total_invested: Decimal,
    /// Win counter increment.
    pub wins: u32,
    /// Loss counter increment.
    pub losses: u32,
    /// Optional flip of the deposit gate.
    pub has_deposited: Option<bool>,
}

impl AccountDelta {
    /// A position opens: debit the balance, lock the principal.
    #[must_use]
    pub fn open(amount: Decimal) -> Self {
        Self {
            balance: -amount,
            total_invested: amount,
            ..Self::default()
        }
    }

    /// A position resolves as a win: principal plus profit return to the
    /// balance, the principal unlocks, the win counter bumps.
    #[must_use]
    pub fn win(principal: Decimal, profit: Decimal) -> Self {
        Self {
            balance: principal + profit,
            total_invested: -principal,
            wins: 1,
            ..Self::default()
        }
    }

    /// A position resolves as a loss: no principal returns, the principal
    /// unlocks, the loss counter bumps.
    #[must_use]
    pub fn loss(principal: Decimal) -> Self {
        Self {
            total_invested: -principal,
            losses: 1,
            ..Self::default()
        }
    }

    /// A verified deposit credits the balance and flips the deposit gate.
    #[must_use]
    pub fn deposit(amount: Decimal) -> Self {
        Self {
            balance: amount,
            has_deposited: Some(true),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn open_delta_moves_balance_into_invested() {
        let account = AccountRecord::with_balance(dec!(1000));
        let updated = account.apply(&AccountDelta::open(dec!(300))).unwrap();

        assert_eq!(updated.balance, dec!(700));
        assert_eq!(updated.total_invested, dec!(300));
        assert_eq!(updated.wins, 0);
        assert_eq!(updated.losses, 0);
    }

    #[test]
    fn win_delta_returns_principal_plus_profit() {
        let account = AccountRecord {
            balance: dec!(700),
            total_invested: dec!(300),
            ..AccountRecord::default()
        };
        let updated = account
            .apply(&AccountDelta::win(dec!(300), dec!(66.25)))
            .unwrap();

        assert_eq!(updated.balance, dec!(1066.25));
        assert_eq!(updated.total_invested, dec!(0));
        assert_eq!(updated.wins, 1);
    }

    #[test]
    fn loss_delta_leaves_balance_untouched() {
        let account = AccountRecord {
            balance: dec!(700),
            total_invested: dec!(300),
            ..AccountRecord::default()
        };
        let updated = account.apply(&AccountDelta::loss(dec!(300))).unwrap();

        assert_eq!(updated.balance, dec!(700));
        assert_eq!(updated.total_invested, dec!(0));
        assert_eq!(updated.losses, 1);
    }

    #[test]
    fn invested_total_clamps_at_zero() {
        let account = AccountRecord {
            balance: dec!(500),
            total_invested: dec!(100),
            ..AccountRecord::default()
        };
        let updated = account.apply(&AccountDelta::loss(dec!(250))).unwrap();

        assert_eq!(updated.total_invested, dec!(0));
    }

    #[test]
    fn overdraw_is_rejected_without_mutation() {
        let account = AccountRecord::with_balance(dec!(100));
        let err = account.apply(&AccountDelta::open(dec!(250))).unwrap_err();

        assert!(matches!(
            err,
            TradeError::InsufficientFunds {
                required,
                available,
            } if required == dec!(250) && available == dec!(100)
        ));
        // The source record is untouched by a rejected apply.
        assert_eq!(account.balance, dec!(100));
        assert_eq!(account.total_invested, dec!(0));
    }

    #[test]
    fn deposit_delta_flips_gate() {
        let account = AccountRecord::default();
        assert!(!account.has_deposited);

        let updated = account.apply(&AccountDelta::deposit(dec!(250))).unwrap();
        assert_eq!(updated.balance, dec!(250));
        assert!(updated.has_deposited);
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut account = AccountRecord {
            balance: dec!(100),
            total_invested: dec!(50),
            wins: 3,
            losses: 1,
            has_deposited: true,
        };

        account.merge(&AccountPatch::with_balance(dec!(999)));

        assert_eq!(account.balance, dec!(999));
        assert_eq!(account.total_invested, dec!(50));
        assert_eq!(account.wins, 3);
        assert!(account.has_deposited);
    }

    #[test]
    fn record_serialization_roundtrip() {
        let account = AccountRecord {
            balance: dec!(420.69),
            total_invested: dec!(100),
            wins: 7,
            losses: 1,
            has_deposited: true,
        };

        let json = serde_json::to_string(&account).unwrap();
        let back: AccountRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }
}
