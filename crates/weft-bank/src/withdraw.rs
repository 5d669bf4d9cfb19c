//! Slice: withdraw money from an account.

use weft_store::EventStore;

use crate::account::{account_filter, project_account};
use crate::error::BankError;
use crate::events::BankEvent;

/// Withdraws `amount` minor units from the account.
///
/// The insufficient-funds check runs against the projected balance of the
/// account's context, and the conditional append guarantees that balance
/// was still current at commit time: a racing deposit, withdrawal, or
/// transfer on the same account invalidates the expectation.
///
/// # Errors
///
/// [`BankError::AccountNotFound`], [`BankError::InvalidAmount`],
/// [`BankError::CurrencyMismatch`], [`BankError::InsufficientFunds`], or a
/// passed-through store error.
pub async fn withdraw(
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
    if state.balance < amount {
        return Err(BankError::InsufficientFunds {
            account_id: account_id.to_string(),
            balance: state.balance,
            requested: amount,
        });
    }

    let withdrawn = BankEvent::MoneyWithdrawn {
        account_id: account_id.to_string(),
        amount,
        currency: currency.to_string(),
    };
    store
        .append(
            &filter,
            vec![withdrawn.to_new_event()?],
            Some(context.max_sequence_number),
        )
        .await?;

    tracing::debug!(account_id, amount, "withdrawal applied");
    Ok(())
}
