//! Slice: transfer money between two accounts.

use serde_json::json;
use weft_store::{EventFilter, EventStore};

use crate::account::{project_account, BALANCE_EVENT_TYPES};
use crate::error::BankError;
use crate::events::BankEvent;

/// Filter covering the transfer's full decision context: both accounts'
/// histories plus any prior use of this transfer id.
fn transfer_filter(transfer_id: &str, from_account: &str, to_account: &str) -> EventFilter {
    EventFilter::new(BALANCE_EVENT_TYPES)
        .expect("static event type set is non-empty")
        .with_payload_predicate("account_id", json!(from_account))
        .with_payload_predicate("account_id", json!(to_account))
        .with_payload_predicate("from_account", json!(from_account))
        .with_payload_predicate("from_account", json!(to_account))
        .with_payload_predicate("to_account", json!(from_account))
        .with_payload_predicate("to_account", json!(to_account))
        .with_payload_predicate("transfer_id", json!(transfer_id))
}

/// Moves `amount` minor units from one account to another, exactly once
/// per transfer id.
///
/// The append uses the same filter the context was read with, so both the
/// duplicate-id check and both balance checks are protected by one
/// expectation: any concurrent write touching either account or reusing
/// the id invalidates it.
///
/// # Errors
///
/// [`BankError::SelfTransfer`], [`BankError::InvalidAmount`],
/// [`BankError::AccountNotFound`] for either side,
/// [`BankError::CurrencyMismatch`] when the accounts disagree,
/// [`BankError::InsufficientFunds`], [`BankError::DuplicateTransfer`], or
/// a passed-through store error.
pub async fn transfer(
    store: &EventStore,
    transfer_id: &str,
    from_account: &str,
    to_account: &str,
    amount: i64,
) -> Result<(), BankError> {
    if amount <= 0 {
        return Err(BankError::InvalidAmount(amount));
    }
    if from_account == to_account {
        return Err(BankError::SelfTransfer);
    }

    let filter = transfer_filter(transfer_id, from_account, to_account);
    let context = store.query(&filter).await?;

    for stored in &context.events {
        if let BankEvent::MoneyTransferred {
            transfer_id: id, ..
        } = BankEvent::from_stored(stored)?
        {
            if id == transfer_id {
                return Err(BankError::DuplicateTransfer(transfer_id.to_string()));
            }
        }
    }

    let from_state = project_account(from_account, &context.events)?
        .ok_or_else(|| BankError::AccountNotFound(from_account.to_string()))?;
    let to_state = project_account(to_account, &context.events)?
        .ok_or_else(|| BankError::AccountNotFound(to_account.to_string()))?;

    if from_state.currency != to_state.currency {
        return Err(BankError::CurrencyMismatch {
            account_id: to_account.to_string(),
            account_currency: to_state.currency,
            requested_currency: from_state.currency,
        });
    }
    if from_state.balance < amount {
        return Err(BankError::InsufficientFunds {
            account_id: from_account.to_string(),
            balance: from_state.balance,
            requested: amount,
        });
    }

    let transferred = BankEvent::MoneyTransferred {
        transfer_id: transfer_id.to_string(),
        from_account: from_account.to_string(),
        to_account: to_account.to_string(),
        amount,
        currency: from_state.currency,
    };
    store
        .append(
            &filter,
            vec![transferred.to_new_event()?],
            Some(context.max_sequence_number),
        )
        .await?;

    tracing::debug!(transfer_id, from_account, to_account, amount, "transfer applied");
    Ok(())
}
