//! Orders, owned by exactly one account and referenced by id only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub order_id:   String,
  /// The account that placed the order.
  pub account_id: String,
  pub order_date: DateTime<Utc>,
}

/// Newest first; equal dates fall back to ascending order id so the result is
/// deterministic.
pub fn sort_newest_first(orders: &mut [Order]) {
  orders.sort_by(|a, b| {
    b.order_date
      .cmp(&a.order_date)
      .then_with(|| a.order_id.cmp(&b.order_id))
  });
}
