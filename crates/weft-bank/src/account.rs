//! Account context: the filter and balance projection shared by the
//! slices, and the read-only get-account slice.

use serde_json::json;
use weft_store::{EventFilter, EventStore, StoredEvent};

use crate::error::BankError;
use crate::events::BankEvent;

/// Every event type that can affect an account's balance.
pub(crate) const BALANCE_EVENT_TYPES: [&str; 4] = [
    "BankAccountOpened",
    "MoneyDeposited",
    "MoneyWithdrawn",
    "MoneyTransferred",
];

/// A read-only view of an account, projected from its event context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub account_id: String,
    pub owner: String,
    pub currency: String,
    /// Balance in minor units.
    pub balance: i64,
}

/// Projected state internal to the slices.
#[derive(Debug, Clone)]
pub(crate) struct AccountState {
    pub owner: String,
    pub currency: String,
    pub balance: i64,
}

/// Filter covering every event in the account's context: events carrying
/// its id directly, plus transfers where it appears on either side.
pub(crate) fn account_filter(account_id: &str) -> EventFilter {
    EventFilter::new(BALANCE_EVENT_TYPES)
        .expect("static event type set is non-empty")
        .with_payload_predicate("account_id", json!(account_id))
        .with_payload_predicate("from_account", json!(account_id))
        .with_payload_predicate("to_account", json!(account_id))
}

/// Folds the context into the account's state, or `None` if the account
/// was never opened. Events addressing other accounts (a transfer context
/// contains both sides) are skipped.
pub(crate) fn project_account(
    account_id: &str,
    events: &[StoredEvent],
) -> Result<Option<AccountState>, BankError> {
    let mut state: Option<AccountState> = None;

    for stored in events {
        match BankEvent::from_stored(stored)? {
            BankEvent::BankAccountOpened {
                account_id: id,
                owner,
                currency,
            } if id == account_id => {
                state = Some(AccountState {
                    owner,
                    currency,
                    balance: 0,
                });
            }
            BankEvent::MoneyDeposited {
                account_id: id,
                amount,
                ..
            } if id == account_id => {
                if let Some(s) = state.as_mut() {
                    s.balance += amount;
                }
            }
            BankEvent::MoneyWithdrawn {
                account_id: id,
                amount,
                ..
            } if id == account_id => {
                if let Some(s) = state.as_mut() {
                    s.balance -= amount;
                }
            }
            BankEvent::MoneyTransferred {
                from_account,
                to_account,
                amount,
                ..
            } => {
                if let Some(s) = state.as_mut() {
                    if from_account == account_id {
                        s.balance -= amount;
                    }
                    if to_account == account_id {
                        s.balance += amount;
                    }
                }
            }
            _ => {}
        }
    }

    Ok(state)
}

/// Returns the current view of an account.
///
/// # Errors
///
/// Returns [`BankError::AccountNotFound`] if no open event exists, or a
/// passed-through store error.
pub async fn get_account(store: &EventStore, account_id: &str) -> Result<AccountView, BankError> {
    let filter = account_filter(account_id);
    let context = store.query(&filter).await?;
    let state = project_account(account_id, &context.events)?
        .ok_or_else(|| BankError::AccountNotFound(account_id.to_string()))?;

    Ok(AccountView {
        account_id: account_id.to_string(),
        owner: state.owner,
        currency: state.currency,
        balance: state.balance,
    })
}
