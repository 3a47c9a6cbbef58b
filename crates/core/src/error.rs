//! Error types for the simulated trade ledger.
//!
//! Provides typed errors for deployment preconditions, catalog lookups,
//! and persistence failures.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the trade lifecycle and the account store.
#[derive(Debug, Error)]
pub enum TradeError {
    /// Spendable balance is too small to cover the requested deployment.
    ///
    /// Callers should steer the user toward the deposit flow.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount the deployment needed.
        required: Decimal,
        /// Spendable balance at the time of the attempt.
        available: Decimal,
    },

    /// Requested amount is under the strategy's minimum investment.
    #[error("amount {requested} is below the strategy minimum of {minimum}")]
    BelowMinimum {
        /// Minimum investment the strategy accepts.
        minimum: Decimal,
        /// Amount the caller asked for.
        requested: Decimal,
    },

    /// The strategy exists but is not accepting deployments.
    #[error("strategy inactive: {name}")]
    StrategyInactive {
        /// Display name of the inactive strategy.
        name: String,
    },

    /// No strategy with the given id in the catalog.
    #[error("unknown strategy: {id}")]
    UnknownStrategy {
        /// The id that failed to resolve.
        id: String,
    },

    /// A strategy record failed its field invariants.
    #[error("invalid strategy {name}: {reason}")]
    InvalidStrategy {
        /// Display name of the offending strategy.
        name: String,
        /// Which invariant was violated.
        reason: String,
    },

    /// No account record for the given id.
    #[error("account not found: {account_id}")]
    AccountNotFound {
        /// The account id that failed to resolve.
        account_id: String,
    },

    /// The persistence collaborator failed.
    #[error("store error: {0}")]
    Store(String),
}

impl TradeError {
    /// Creates an insufficient-funds error.
    #[must_use]
    pub const fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Creates a below-minimum error.
    #[must_use]
    pub const fn below_minimum(minimum: Decimal, requested: Decimal) -> Self {
        Self::BelowMinimum { minimum, requested }
    }

    /// Creates an account-not-found error.
    pub fn account_not_found(account_id: impl Into<String>) -> Self {
        Self::AccountNotFound {
            account_id: account_id.into(),
        }
    }

    /// Creates an unknown-strategy error.
    pub fn unknown_strategy(id: impl Into<String>) -> Self {
        Self::UnknownStrategy { id: id.into() }
    }

    /// Creates an invalid-strategy error.
    pub fn invalid_strategy(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStrategy {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a store error from any displayable failure.
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }

    /// True when the failure should route the user to the deposit flow.
    #[must_use]
    pub const fn needs_deposit(&self) -> bool {
        matches!(self, Self::InsufficientFunds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_funds_formats_amounts() {
        let err = TradeError::insufficient_funds(dec!(500), dec!(120.50));
        assert_eq!(
            err.to_string(),
            "insufficient funds: required 500, available 120.50"
        );
    }

    #[test]
    fn insufficient_funds_routes_to_deposit() {
        let err = TradeError::insufficient_funds(dec!(100), dec!(0));
        assert!(err.needs_deposit());

        let err = TradeError::below_minimum(dec!(100), dec!(50));
        assert!(!err.needs_deposit());
    }

    #[test]
    fn below_minimum_formats_both_sides() {
        let err = TradeError::below_minimum(dec!(250), dec!(100));
        assert_eq!(
            err.to_string(),
            "amount 100 is below the strategy minimum of 250"
        );
    }

    #[test]
    fn store_error_wraps_any_display() {
        let err = TradeError::store("backend unreachable");
        assert_eq!(err.to_string(), "store error: backend unreachable");
    }
}
