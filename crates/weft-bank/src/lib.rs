//! Sample banking domain for the weft event store.
//!
//! Five feature slices — open, deposit, withdraw, transfer, and
//! get-account — each implemented as the same three-step shape:
//!
//! 1. build a filter describing the decision's context,
//! 2. query it and run a pure decision over the returned events,
//! 3. append the outcome gated on the context's max sequence number.
//!
//! There are no aggregates and no per-account version columns; the
//! conditional append is the only consistency mechanism. Store errors pass
//! through [`BankError`] unchanged except where a conflict has an exact
//! domain meaning (losing the open-account race *is* "account already
//! exists").

mod account;
mod deposit;
mod error;
mod events;
mod open_account;
mod transfer;
mod withdraw;

pub use account::{get_account, AccountView};
pub use deposit::deposit;
pub use error::BankError;
pub use events::{BankEvent, SUPPORTED_CURRENCIES};
pub use open_account::open_account;
pub use transfer::transfer;
pub use withdraw::withdraw;
