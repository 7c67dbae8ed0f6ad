//! Storage traits consumed by the components.
//!
//! Implemented by storage backends (`covey-store-sqlite`, and
//! [`crate::memory::MemoryStore`] for tests and ephemeral servers). The
//! components depend on these abstractions, never on a concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, Utc};

use crate::{account::Account, invitation::Invitation, order::Order};

/// Per-account lower bound on `order_date`, keyed by account id.
pub type HistoryWindows = HashMap<String, DateTime<Utc>>;

// ─── Accounts ────────────────────────────────────────────────────────────────

pub trait AccountStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_account<'a>(
    &'a self,
    account_id: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  fn account_exists<'a>(
    &'a self,
    account_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert a new account. Returns `false` without writing if the id is
  /// already taken.
  fn insert_account<'a>(
    &'a self,
    account: &'a Account,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Overwrite the full record of an existing account.
  fn put_account<'a>(
    &'a self,
    account: &'a Account,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// All accounts whose `parent_account_id` is `parent_account_id`.
  fn list_sub_accounts<'a>(
    &'a self,
    parent_account_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + 'a;
}

// ─── Invitations ─────────────────────────────────────────────────────────────

pub trait InvitationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_invitation(
    &self,
    invitation_id: i64,
  ) -> impl Future<Output = Result<Option<Invitation>, Self::Error>> + Send + '_;

  /// Persist a new `NO_ACTION` invitation, assigning the next id.
  /// `invitation_date` and `status_change_date` are both set to `at`.
  fn create_invitation<'a>(
    &'a self,
    parent_account_id: &'a str,
    sub_account_id: &'a str,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Invitation, Self::Error>> + Send + 'a;

  /// Write the status of an invitation that is still `NO_ACTION` in the
  /// store. Returns `false`, writing nothing, if it was already resolved.
  fn put_invitation<'a>(
    &'a self,
    invitation: &'a Invitation,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn put_invitations<'a>(
    &'a self,
    invitations: &'a [Invitation],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// `NO_ACTION` invitations addressed to `sub_account_id`, ascending id.
  fn find_pending_by_sub_account<'a>(
    &'a self,
    sub_account_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Invitation>, Self::Error>> + Send + 'a;
}

// ─── Orders ──────────────────────────────────────────────────────────────────

pub trait OrderStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert a new order. Returns `false` without writing if the order id is
  /// already taken.
  fn insert_order<'a>(
    &'a self,
    order: &'a Order,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn count_by_account<'a>(
    &'a self,
    account_id: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  fn find_by_account<'a>(
    &'a self,
    account_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + 'a;

  /// Orders of every account in `windows` dated at or after that account's
  /// bound.
  fn find_by_accounts_since<'a>(
    &'a self,
    windows: &'a HistoryWindows,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + 'a;
}

// ─── Combined ────────────────────────────────────────────────────────────────

/// A backend holding all three record kinds, able to write across them
/// atomically.
pub trait Store: AccountStore + InvitationStore + OrderStore {
  /// Persist a freshly linked sub-account together with the resolved
  /// invitations in one atomic unit.
  ///
  /// The write is conditional on the stored account still being
  /// `INDIVIDUAL`; if it is not, nothing is written and `false` is
  /// returned.
  fn link_sub_account<'a>(
    &'a self,
    account: &'a Account,
    invitations: &'a [Invitation],
  ) -> impl Future<Output = Result<bool, <Self as AccountStore>::Error>>
  + Send
  + 'a;
}
