//! Error types for the banking slices.

use thiserror::Error;
use weft_store::StoreError;

/// Errors returned by the banking feature slices.
#[derive(Debug, Error)]
pub enum BankError {
    /// The account has already been opened.
    #[error("account {0} already exists")]
    AccountAlreadyExists(String),

    /// No `BankAccountOpened` event exists for the account.
    #[error("account {0} not found")]
    AccountNotFound(String),

    /// The projected balance does not cover the requested amount.
    #[error("insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: String,
        balance: i64,
        requested: i64,
    },

    /// Amounts must be strictly positive minor units.
    #[error("amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// The currency is not in the supported set.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// The operation's currency does not match the account's.
    #[error("currency mismatch: account {account_id} is denominated in {account_currency}, got {requested_currency}")]
    CurrencyMismatch {
        account_id: String,
        account_currency: String,
        requested_currency: String,
    },

    /// A transfer with this id was already applied.
    #[error("transfer {0} was already applied")]
    DuplicateTransfer(String),

    /// Transfers need two distinct accounts.
    #[error("cannot transfer from an account to itself")]
    SelfTransfer,

    /// The owner name must not be blank.
    #[error("owner name must not be blank")]
    BlankOwner,

    /// A store failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored payload failed to decode as a domain event.
    #[error("event codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
