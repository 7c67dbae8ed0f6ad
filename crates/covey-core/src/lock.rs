//! Per-account mutual exclusion.
//!
//! Every mutating operation holds the lock of exactly one account id for its
//! whole read-check-write sequence, so two requests touching the same account
//! are serialised while unrelated accounts proceed in parallel.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lazily-populated table of one async mutex per account id.
#[derive(Debug, Default)]
pub struct AccountLocks {
  table: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of a critical section; releases on drop.
pub type AccountGuard = OwnedMutexGuard<()>;

impl AccountLocks {
  /// Wait for exclusive access to `account_id`.
  pub async fn lock(&self, account_id: &str) -> AccountGuard {
    let slot = {
      let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries referenced only by the table are idle.
      table.retain(|_, m| Arc::strong_count(m) > 1);
      table
        .entry(account_id.to_owned())
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone()
    };
    slot.lock_owned().await
  }

  /// Number of ids currently tracked.
  pub fn len(&self) -> usize {
    self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
