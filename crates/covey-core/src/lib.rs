//! Core types, store traits, and hierarchy rules for Covey.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement the traits in [`store`]; transports drive the
//! components bundled in [`Services`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod caller;
pub mod directory;
pub mod error;
pub mod hierarchy;
pub mod history;
pub mod invitation;
pub mod ledger;
pub mod lock;
pub mod memory;
pub mod order;
pub mod store;

use std::sync::Arc;

pub use caller::Caller;
pub use error::{Error, Result};

use crate::{
  directory::AccountDirectory, hierarchy::AccountHierarchyManager,
  history::OrderHistoryAggregator, ledger::InvitationLedger,
  lock::AccountLocks, store::Store,
};

/// The four components wired over one store and one lock table.
///
/// Cloning is cheap; every component holds `Arc`s.
pub struct Services<S: Store> {
  pub directory: AccountDirectory<S>,
  pub ledger:    InvitationLedger<S>,
  pub hierarchy: AccountHierarchyManager<S>,
  pub orders:    OrderHistoryAggregator<S>,
}

impl<S: Store> Services<S> {
  pub fn new(store: Arc<S>) -> Self {
    let locks = Arc::new(AccountLocks::default());
    let directory = AccountDirectory::new(store.clone());
    let ledger =
      InvitationLedger::new(store.clone(), directory.clone(), locks.clone());
    let orders = OrderHistoryAggregator::new(store, directory.clone());
    let hierarchy = AccountHierarchyManager::new(
      directory.clone(),
      ledger.clone(),
      orders.clone(),
      locks,
    );
    Self { directory, ledger, hierarchy, orders }
  }
}

impl<S: Store> Clone for Services<S> {
  fn clone(&self) -> Self {
    Self {
      directory: self.directory.clone(),
      ledger:    self.ledger.clone(),
      hierarchy: self.hierarchy.clone(),
      orders:    self.orders.clone(),
    }
  }
}
