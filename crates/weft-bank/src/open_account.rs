//! Slice: open a new bank account.

use serde_json::json;
use weft_store::{EventFilter, EventStore, StoreError};

use crate::error::BankError;
use crate::events::{BankEvent, SUPPORTED_CURRENCIES};

/// Opens an account with the given id, owner, and currency.
///
/// The decision context is every `BankAccountOpened` event carrying this
/// account id: an empty context means the id is free. The conditional
/// append makes the uniqueness check race-safe — if two clients race to
/// open the same id, the loser's context has changed and its append is
/// rejected.
///
/// # Errors
///
/// [`BankError::AccountAlreadyExists`] when the id is taken (including
/// losing the race), [`BankError::BlankOwner`] /
/// [`BankError::UnsupportedCurrency`] on invalid input, or a
/// passed-through store error.
pub async fn open_account(
    store: &EventStore,
    account_id: &str,
    owner: &str,
    currency: &str,
) -> Result<(), BankError> {
    if owner.trim().is_empty() {
        return Err(BankError::BlankOwner);
    }
    if !SUPPORTED_CURRENCIES.contains(&currency) {
        return Err(BankError::UnsupportedCurrency(currency.to_string()));
    }

    let filter = EventFilter::new(["BankAccountOpened"])
        .expect("static event type set is non-empty")
        .with_payload_predicate("account_id", json!(account_id));

    let context = store.query(&filter).await?;
    if !context.events.is_empty() {
        return Err(BankError::AccountAlreadyExists(account_id.to_string()));
    }

    let opened = BankEvent::BankAccountOpened {
        account_id: account_id.to_string(),
        owner: owner.to_string(),
        currency: currency.to_string(),
    };

    match store
        .append(
            &filter,
            vec![opened.to_new_event()?],
            Some(context.max_sequence_number),
        )
        .await
    {
        // A conflict on this context can only mean another open for the
        // same id won the race.
        Err(StoreError::ConcurrencyConflict { .. }) => {
            Err(BankError::AccountAlreadyExists(account_id.to_string()))
        }
        other => {
            other?;
            tracing::debug!(account_id, "account opened");
            Ok(())
        }
    }
}
