//! Domain events for the banking sample.
//!
//! Payloads are serde-tagged: the variant name lands in the payload's
//! `event` field and is mirrored into the store's `event_type` column, so
//! filters can dispatch on the type tag while payload predicates address
//! the fields.

use serde::{Deserialize, Serialize};
use weft_store::{NewEvent, StoredEvent};

/// Currencies the sample accepts. Amounts are integer minor units (cents).
pub const SUPPORTED_CURRENCIES: &[&str] = &["EUR", "USD", "GBP"];

/// Everything that can happen to a bank account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum BankEvent {
    /// A new account was opened.
    BankAccountOpened {
        account_id: String,
        owner: String,
        currency: String,
    },

    /// Money was paid into an account.
    MoneyDeposited {
        account_id: String,
        amount: i64,
        currency: String,
    },

    /// Money was taken out of an account.
    MoneyWithdrawn {
        account_id: String,
        amount: i64,
        currency: String,
    },

    /// Money moved between two accounts.
    MoneyTransferred {
        transfer_id: String,
        from_account: String,
        to_account: String,
        amount: i64,
        currency: String,
    },
}

impl BankEvent {
    /// Returns the canonical type tag for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BankAccountOpened { .. } => "BankAccountOpened",
            Self::MoneyDeposited { .. } => "MoneyDeposited",
            Self::MoneyWithdrawn { .. } => "MoneyWithdrawn",
            Self::MoneyTransferred { .. } => "MoneyTransferred",
        }
    }

    /// Converts this event into the shape the store appends.
    pub fn to_new_event(&self) -> Result<NewEvent, serde_json::Error> {
        let payload = serde_json::to_value(self)?;
        Ok(NewEvent::new(self.event_type(), payload))
    }

    /// Decodes a stored event back into the domain. Dispatch runs on the
    /// payload's `event` tag.
    pub fn from_stored(event: &StoredEvent) -> Result<Self, serde_json::Error> {
        serde_json::from_value(event.payload.clone())
    }
}
