//! End-to-end flows for the banking slices over a real store.

use tempfile::TempDir;
use weft_bank::{
    deposit, get_account, open_account, transfer, withdraw, BankError,
};
use weft_store::{EventStore, StoreConfig};

async fn open_store() -> (TempDir, EventStore) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("bank.db");
    let store = EventStore::open(&StoreConfig::new(path.to_str().expect("utf-8 path")))
        .expect("store should open");
    store.migrate().await.expect("migrations should succeed");
    (dir, store)
}

#[tokio::test]
async fn open_then_get_account() {
    let (_dir, store) = open_store().await;

    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open should succeed");

    let view = get_account(&store, "a-1").await.expect("get should succeed");
    assert_eq!(view.account_id, "a-1");
    assert_eq!(view.owner, "Ada");
    assert_eq!(view.currency, "EUR");
    assert_eq!(view.balance, 0);
}

#[tokio::test]
async fn duplicate_open_is_rejected() {
    let (_dir, store) = open_store().await;

    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("first open should succeed");
    let err = open_account(&store, "a-1", "Grace", "USD")
        .await
        .expect_err("second open should fail");
    assert!(matches!(err, BankError::AccountAlreadyExists(id) if id == "a-1"));

    // The original account is untouched.
    let view = get_account(&store, "a-1").await.expect("get should succeed");
    assert_eq!(view.owner, "Ada");
}

#[tokio::test]
async fn open_validates_owner_and_currency() {
    let (_dir, store) = open_store().await;

    let err = open_account(&store, "a-1", "   ", "EUR")
        .await
        .expect_err("blank owner should fail");
    assert!(matches!(err, BankError::BlankOwner));

    let err = open_account(&store, "a-1", "Ada", "XXX")
        .await
        .expect_err("unknown currency should fail");
    assert!(matches!(err, BankError::UnsupportedCurrency(c) if c == "XXX"));

    let err = get_account(&store, "a-1")
        .await
        .expect_err("nothing should have been opened");
    assert!(matches!(err, BankError::AccountNotFound(_)));
}

#[tokio::test]
async fn deposit_and_withdraw_update_the_balance() {
    let (_dir, store) = open_store().await;
    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open should succeed");

    deposit(&store, "a-1", 500, "EUR")
        .await
        .expect("deposit should succeed");
    withdraw(&store, "a-1", 150, "EUR")
        .await
        .expect("withdraw should succeed");
    deposit(&store, "a-1", 25, "EUR")
        .await
        .expect("second deposit should succeed");

    let view = get_account(&store, "a-1").await.expect("get should succeed");
    assert_eq!(view.balance, 375);
}

#[tokio::test]
async fn withdraw_rejects_insufficient_funds() {
    let (_dir, store) = open_store().await;
    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open should succeed");
    deposit(&store, "a-1", 100, "EUR")
        .await
        .expect("deposit should succeed");

    let err = withdraw(&store, "a-1", 101, "EUR")
        .await
        .expect_err("overdraft should fail");
    assert!(matches!(
        err,
        BankError::InsufficientFunds {
            balance: 100,
            requested: 101,
            ..
        }
    ));

    let view = get_account(&store, "a-1").await.expect("get should succeed");
    assert_eq!(view.balance, 100, "a rejected withdrawal changes nothing");
}

#[tokio::test]
async fn operations_on_unknown_accounts_fail() {
    let (_dir, store) = open_store().await;

    let err = deposit(&store, "ghost", 100, "EUR")
        .await
        .expect_err("deposit to unknown account should fail");
    assert!(matches!(err, BankError::AccountNotFound(_)));

    let err = withdraw(&store, "ghost", 100, "EUR")
        .await
        .expect_err("withdraw from unknown account should fail");
    assert!(matches!(err, BankError::AccountNotFound(_)));

    let err = get_account(&store, "ghost")
        .await
        .expect_err("get of unknown account should fail");
    assert!(matches!(err, BankError::AccountNotFound(_)));
}

#[tokio::test]
async fn amounts_must_be_positive() {
    let (_dir, store) = open_store().await;
    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open should succeed");

    for amount in [0, -5] {
        let err = deposit(&store, "a-1", amount, "EUR")
            .await
            .expect_err("non-positive deposit should fail");
        assert!(matches!(err, BankError::InvalidAmount(a) if a == amount));

        let err = withdraw(&store, "a-1", amount, "EUR")
            .await
            .expect_err("non-positive withdrawal should fail");
        assert!(matches!(err, BankError::InvalidAmount(a) if a == amount));
    }
}

#[tokio::test]
async fn currency_must_match_the_account() {
    let (_dir, store) = open_store().await;
    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open should succeed");

    let err = deposit(&store, "a-1", 100, "USD")
        .await
        .expect_err("mismatched deposit should fail");
    assert!(matches!(err, BankError::CurrencyMismatch { .. }));
}

#[tokio::test]
async fn transfer_moves_funds_between_accounts() {
    let (_dir, store) = open_store().await;
    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open a-1 should succeed");
    open_account(&store, "a-2", "Grace", "EUR")
        .await
        .expect("open a-2 should succeed");
    deposit(&store, "a-1", 200, "EUR")
        .await
        .expect("deposit should succeed");

    transfer(&store, "t-1", "a-1", "a-2", 80)
        .await
        .expect("transfer should succeed");

    let from = get_account(&store, "a-1").await.expect("get a-1");
    let to = get_account(&store, "a-2").await.expect("get a-2");
    assert_eq!(from.balance, 120);
    assert_eq!(to.balance, 80);
}

#[tokio::test]
async fn transfer_ids_apply_exactly_once() {
    let (_dir, store) = open_store().await;
    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open a-1 should succeed");
    open_account(&store, "a-2", "Grace", "EUR")
        .await
        .expect("open a-2 should succeed");
    deposit(&store, "a-1", 200, "EUR")
        .await
        .expect("deposit should succeed");

    transfer(&store, "t-1", "a-1", "a-2", 50)
        .await
        .expect("first transfer should succeed");
    let err = transfer(&store, "t-1", "a-1", "a-2", 50)
        .await
        .expect_err("replayed transfer should fail");
    assert!(matches!(err, BankError::DuplicateTransfer(id) if id == "t-1"));

    let from = get_account(&store, "a-1").await.expect("get a-1");
    assert_eq!(from.balance, 150, "the duplicate must not debit again");
}

#[tokio::test]
async fn transfer_validates_accounts_funds_and_shape() {
    let (_dir, store) = open_store().await;
    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open a-1 should succeed");
    open_account(&store, "a-2", "Grace", "USD")
        .await
        .expect("open a-2 should succeed");
    deposit(&store, "a-1", 100, "EUR")
        .await
        .expect("deposit should succeed");

    let err = transfer(&store, "t-1", "a-1", "a-1", 10)
        .await
        .expect_err("self transfer should fail");
    assert!(matches!(err, BankError::SelfTransfer));

    let err = transfer(&store, "t-2", "a-1", "ghost", 10)
        .await
        .expect_err("unknown target should fail");
    assert!(matches!(err, BankError::AccountNotFound(id) if id == "ghost"));

    let err = transfer(&store, "t-3", "a-1", "a-2", 10)
        .await
        .expect_err("cross-currency transfer should fail");
    assert!(matches!(err, BankError::CurrencyMismatch { .. }));

    open_account(&store, "a-3", "Alan", "EUR")
        .await
        .expect("open a-3 should succeed");
    let err = transfer(&store, "t-4", "a-1", "a-3", 500)
        .await
        .expect_err("over-balance transfer should fail");
    assert!(matches!(err, BankError::InsufficientFunds { .. }));

    let view = get_account(&store, "a-1").await.expect("get a-1");
    assert_eq!(view.balance, 100, "failed transfers change nothing");
}

#[tokio::test]
async fn interleaved_slices_always_reread_their_context() {
    let (_dir, store) = open_store().await;
    open_account(&store, "a-1", "Ada", "EUR")
        .await
        .expect("open should succeed");

    // Each slice call re-reads its context, so sequential interleavings of
    // different slices never conflict.
    deposit(&store, "a-1", 100, "EUR")
        .await
        .expect("deposit should succeed");
    withdraw(&store, "a-1", 30, "EUR")
        .await
        .expect("withdraw should succeed");
    deposit(&store, "a-1", 7, "EUR")
        .await
        .expect("deposit should succeed");

    let view = get_account(&store, "a-1").await.expect("get should succeed");
    assert_eq!(view.balance, 77);
}
