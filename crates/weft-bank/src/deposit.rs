//! Slice: deposit money into an account.

use weft_store::EventStore;

use crate::account::{account_filter, project_account};
use crate::error::BankError;
use crate::events::BankEvent;

/// Deposits `amount` minor units into the account.
///
/// The decision context is the account's full balance history. The append
/// carries the context's max sequence number, so any concurrent write to
/// the same account surfaces as a store conflict; callers re-read and
/// retry.
///
/// # Errors
///
/// [`BankError::AccountNotFound`], [`BankError::InvalidAmount`],
/// [`BankError::CurrencyMismatch`], or a passed-through store error
/// (including the concurrency conflict).
pub async fn deposit(
    store: &EventStore,
    account_id: &str,
    amount: i64,
    currency: &str,
) -> Result<(), BankError> {
    if amount <= 0 {
        return Err(BankError::InvalidAmount(amount));
    }

    let filter = account_filter(account_id);
    let context = store.query(&filter).await?;
    let state = project_account(account_id, &context.events)?
        .ok_or_else(|| BankError::AccountNotFound(account_id.to_string()))?;

    if state.currency != currency {
        return Err(BankError::CurrencyMismatch {
            account_id: account_id.to_string(),
            account_currency: state.currency,
            requested_currency: currency.to_string(),
        });
    }

    let deposited = BankEvent::MoneyDeposited {
        account_id: account_id.to_string(),
        amount,
        currency: currency.to_string(),
    };
    store
        .append(
            &filter,
            vec![deposited.to_new_event()?],
            Some(context.max_sequence_number),
        )
        .await?;

    tracing::debug!(account_id, amount, "deposit applied");
    Ok(())
}
