//! The economy collaborator contract and an in-memory implementation.
//!
//! The engine never owns balances; it asks the host's currency backend to
//! charge and credit accounts. The contract is deliberately small and
//! infallible at the type level: a charge either happens (`true`) or it
//! does not (`false`), and an unreachable backend simply answers `false`,
//! to be retried on the next natural billing cycle.

use std::collections::BTreeMap;
use std::sync::Mutex;

use freehold_types::AccountId;
use rust_decimal::Decimal;

/// The host's currency backend.
pub trait Economy: Send + Sync {
    /// Withdraw `amount` from the account. Returns whether the withdrawal
    /// happened. Charging a non-positive amount is the defined
    /// free-operation case and always returns `true`.
    fn charge(&self, account: AccountId, amount: Decimal) -> bool;

    /// Deposit `amount` into the account.
    fn give(&self, account: AccountId, amount: Decimal);

    /// Whether the account could currently cover `amount`.
    fn has(&self, account: AccountId, amount: Decimal) -> bool;

    /// Render an amount for player-facing messages.
    fn format(&self, amount: Decimal) -> String;
}

/// A simple balance map guarded by a mutex.
///
/// Used by tests and standalone runs; production hosts wire in their own
/// backend. Accounts start at zero; the server account is bottomless.
#[derive(Debug, Default)]
pub struct InMemoryEconomy {
    balances: Mutex<BTreeMap<AccountId, Decimal>>,
}

impl InMemoryEconomy {
    /// Create an economy with no balances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an economy with the given starting balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (AccountId, Decimal)>) -> Self {
        Self {
            balances: Mutex::new(balances.into_iter().collect()),
        }
    }

    /// The current balance of an account.
    pub fn balance(&self, account: AccountId) -> Decimal {
        self.balances
            .lock()
            .ok()
            .and_then(|map| map.get(&account).copied())
            .unwrap_or(Decimal::ZERO)
    }
}

impl Economy for InMemoryEconomy {
    fn charge(&self, account: AccountId, amount: Decimal) -> bool {
        if amount <= Decimal::ZERO {
            return true;
        }
        if account.is_server() {
            return true;
        }
        let Ok(mut map) = self.balances.lock() else {
            return false;
        };
        let balance = map.entry(account).or_insert(Decimal::ZERO);
        match balance.checked_sub(amount) {
            Some(remaining) if remaining >= Decimal::ZERO => {
                *balance = remaining;
                true
            }
            _ => false,
        }
    }

    fn give(&self, account: AccountId, amount: Decimal) {
        if amount <= Decimal::ZERO || account.is_server() {
            return;
        }
        if let Ok(mut map) = self.balances.lock() {
            let balance = map.entry(account).or_insert(Decimal::ZERO);
            *balance = balance.checked_add(amount).unwrap_or(Decimal::MAX);
        }
    }

    fn has(&self, account: AccountId, amount: Decimal) -> bool {
        account.is_server() || self.balance(account) >= amount
    }

    fn format(&self, amount: Decimal) -> String {
        format!("${amount:.2}")
    }
}
