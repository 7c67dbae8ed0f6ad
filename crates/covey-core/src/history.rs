//! [`OrderHistoryAggregator`]: order placement and hierarchy-aware history.
//!
//! The history of an account is its own orders plus, for each linked
//! sub-account, the orders dated at or after that sub-account's cutoff. The
//! two sets are fetched separately and merged here; no backend-side union is
//! assumed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  directory::AccountDirectory,
  order::{Order, sort_newest_first},
  store::{HistoryWindows, Store},
};

pub struct OrderHistoryAggregator<S: Store> {
  store:     Arc<S>,
  directory: AccountDirectory<S>,
}

impl<S: Store> Clone for OrderHistoryAggregator<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      directory: self.directory.clone(),
    }
  }
}

impl<S: Store> OrderHistoryAggregator<S> {
  pub fn new(store: Arc<S>, directory: AccountDirectory<S>) -> Self {
    Self { store, directory }
  }

  /// Place an order dated now.
  pub async fn place_order(&self, account_id: &str, order_id: &str) -> Result<Order> {
    self.place_order_at(account_id, order_id, Utc::now()).await
  }

  /// Place an order with an explicit date, e.g. when importing history.
  pub async fn place_order_at(
    &self,
    account_id: &str,
    order_id: &str,
    order_date: DateTime<Utc>,
  ) -> Result<Order> {
    if order_id.trim().is_empty() {
      return Err(Error::InvalidArgument("order id is required".into()));
    }
    if !self.directory.exists(account_id).await? {
      return Err(Error::NotFound(format!("account {account_id} not found")));
    }

    let order = Order {
      order_id: order_id.to_owned(),
      account_id: account_id.to_owned(),
      order_date,
    };
    let inserted = self.store.insert_order(&order).await.map_err(Error::store)?;
    if !inserted {
      return Err(Error::Conflict(format!("order {order_id} already exists")));
    }

    tracing::debug!(account_id, order_id, "order placed");
    Ok(order)
  }

  /// Number of orders placed by `account_id` itself.
  pub async fn count(&self, account_id: &str) -> Result<u64> {
    self
      .store
      .count_by_account(account_id)
      .await
      .map_err(Error::store)
  }

  /// Orders visible to `account_id`, newest first (ties by ascending order
  /// id).
  pub async fn history(&self, account_id: &str) -> Result<Vec<Order>> {
    if !self.directory.exists(account_id).await? {
      return Err(Error::NotFound(format!("account {account_id} not found")));
    }

    let mut orders = self
      .store
      .find_by_account(account_id)
      .await
      .map_err(Error::store)?;

    let windows: HistoryWindows = self
      .directory
      .sub_accounts(account_id)
      .await?
      .into_iter()
      .filter_map(|sub| {
        sub
          .sub_account_history_from
          .map(|since| (sub.account_id, since))
      })
      .collect();

    if !windows.is_empty() {
      let shared = self
        .store
        .find_by_accounts_since(&windows)
        .await
        .map_err(Error::store)?;
      tracing::debug!(
        account_id,
        sub_accounts = windows.len(),
        shared = shared.len(),
        "merging sub account orders"
      );
      orders.extend(shared);
    }

    sort_newest_first(&mut orders);
    Ok(orders)
  }
}
