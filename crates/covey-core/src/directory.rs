//! [`AccountDirectory`]: lookup, creation and persistence of accounts.
//!
//! A pure store boundary: it validates input presence and maps missing
//! records to [`Error::NotFound`], nothing more. Hierarchy rules live in
//! [`crate::hierarchy`] and [`crate::ledger`].

use std::sync::Arc;

use chrono::Utc;

use crate::{
  Error, Result,
  account::{Account, NewAccount},
  store::Store,
};

pub struct AccountDirectory<S: Store> {
  store: Arc<S>,
}

impl<S: Store> Clone for AccountDirectory<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: Store> AccountDirectory<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Fetch an account, failing with [`Error::NotFound`] if absent.
  pub async fn get(&self, account_id: &str) -> Result<Account> {
    self
      .find(account_id)
      .await?
      .ok_or_else(|| Error::NotFound(format!("account {account_id} not found")))
  }

  pub async fn find(&self, account_id: &str) -> Result<Option<Account>> {
    self.store.get_account(account_id).await.map_err(Error::store)
  }

  pub async fn exists(&self, account_id: &str) -> Result<bool> {
    self.store.account_exists(account_id).await.map_err(Error::store)
  }

  /// Create an `INDIVIDUAL` account stamped with the current time.
  pub async fn create(&self, input: NewAccount) -> Result<Account> {
    if input.account_id.trim().is_empty() {
      return Err(Error::InvalidArgument("account id is required".into()));
    }
    if input.first_name.trim().is_empty() {
      return Err(Error::InvalidArgument("first name is required".into()));
    }

    let account = Account::new(input, Utc::now());
    let inserted = self
      .store
      .insert_account(&account)
      .await
      .map_err(Error::store)?;
    if !inserted {
      return Err(Error::Conflict(format!(
        "account {} already exists",
        account.account_id
      )));
    }

    tracing::info!(account_id = %account.account_id, "account created");
    Ok(account)
  }

  /// Persist the full record.
  pub async fn save(&self, account: &Account) -> Result<()> {
    self.store.put_account(account).await.map_err(Error::store)
  }

  pub async fn sub_accounts(&self, parent_account_id: &str) -> Result<Vec<Account>> {
    self
      .store
      .list_sub_accounts(parent_account_id)
      .await
      .map_err(Error::store)
  }
}
