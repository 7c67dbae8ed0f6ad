//! [`AccountHierarchyManager`], the entry point for every account-type
//! transition.
//!
//! Upgrades and unlinks are implemented here; linking happens through
//! invitation acceptance and is delegated to the [`InvitationLedger`]. Each
//! operation holds the lock of the account whose record it rewrites.

use std::sync::Arc;

use crate::{
  Caller, Error, Result,
  account::{Account, AccountType},
  directory::AccountDirectory,
  history::OrderHistoryAggregator,
  invitation::{Invitation, JoiningFrom},
  ledger::InvitationLedger,
  lock::AccountLocks,
  store::Store,
};

/// Orders an individual account needs before it may become a business.
pub const UPGRADE_ORDER_THRESHOLD: u64 = 10;

pub struct AccountHierarchyManager<S: Store> {
  directory: AccountDirectory<S>,
  ledger:    InvitationLedger<S>,
  orders:    OrderHistoryAggregator<S>,
  locks:     Arc<AccountLocks>,
}

impl<S: Store> Clone for AccountHierarchyManager<S> {
  fn clone(&self) -> Self {
    Self {
      directory: self.directory.clone(),
      ledger:    self.ledger.clone(),
      orders:    self.orders.clone(),
      locks:     self.locks.clone(),
    }
  }
}

impl<S: Store> AccountHierarchyManager<S> {
  pub fn new(
    directory: AccountDirectory<S>,
    ledger: InvitationLedger<S>,
    orders: OrderHistoryAggregator<S>,
    locks: Arc<AccountLocks>,
  ) -> Self {
    Self { directory, ledger, orders, locks }
  }

  /// Promote an individual account to a business account if it has placed
  /// at least [`UPGRADE_ORDER_THRESHOLD`] orders.
  ///
  /// Returns `Ok(false)` and leaves the account untouched when the threshold
  /// is not met.
  pub async fn upgrade_to_business(&self, account_id: &str) -> Result<bool> {
    let _guard = self.locks.lock(account_id).await;

    let mut account = self.directory.get(account_id).await?;
    if account.account_type != AccountType::Individual {
      return Err(Error::InvalidState(format!(
        "account {account_id} is either already a business account or a sub account"
      )));
    }

    let placed = self.orders.count(account_id).await?;
    if placed < UPGRADE_ORDER_THRESHOLD {
      tracing::debug!(account_id, placed, "upgrade declined");
      return Ok(false);
    }

    account.upgrade_to_business()?;
    self.directory.save(&account).await?;

    tracing::info!(account_id, placed, "account upgraded to business");
    Ok(true)
  }

  /// A sub-account leaves its business account.
  pub async fn unlink_self(&self, sub_account_id: &str) -> Result<Account> {
    let _guard = self.locks.lock(sub_account_id).await;

    let mut account = self.directory.get(sub_account_id).await?;
    let parent = account.parent_account_id.clone();
    account.unlink()?;
    self.directory.save(&account).await?;

    tracing::info!(
      sub = sub_account_id,
      parent = parent.as_deref().unwrap_or_default(),
      "sub account unlinked itself"
    );
    Ok(account)
  }

  /// A business account releases one of its own sub-accounts.
  pub async fn unlink_by_parent(
    &self,
    parent_account_id: &str,
    sub_account_id: &str,
  ) -> Result<Account> {
    let _guard = self.locks.lock(sub_account_id).await;

    let parent = self.directory.get(parent_account_id).await?;
    if parent.account_type != AccountType::Business {
      return Err(Error::InvalidState(format!(
        "account {parent_account_id} is not a business account"
      )));
    }

    let mut account = self
      .directory
      .find(sub_account_id)
      .await?
      .filter(|a| a.is_linked_to(parent_account_id))
      .ok_or_else(|| {
        Error::InvalidArgument(format!(
          "account {sub_account_id} is not a sub account of {parent_account_id}"
        ))
      })?;
    account.unlink()?;
    self.directory.save(&account).await?;

    tracing::info!(
      sub = sub_account_id,
      parent = parent_account_id,
      "sub account unlinked by parent"
    );
    Ok(account)
  }

  pub async fn send_invitation(
    &self,
    caller: &Caller,
    sub_account_id: &str,
  ) -> Result<Invitation> {
    self.ledger.send(caller.account_id(), sub_account_id).await
  }

  pub async fn accept_invitation(
    &self,
    caller: &Caller,
    invitation_id: i64,
    joining_from: JoiningFrom,
  ) -> Result<Account> {
    self.ledger.accept(caller, invitation_id, joining_from).await
  }

  pub async fn reject_invitation(
    &self,
    caller: &Caller,
    invitation_id: i64,
  ) -> Result<Invitation> {
    self.ledger.reject(caller, invitation_id).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Services, account::NewAccount, memory::MemoryStore};

  async fn services_with(ids: &[&str]) -> Services<MemoryStore> {
    let services = Services::new(Arc::new(MemoryStore::new()));
    for id in ids {
      services
        .directory
        .create(NewAccount {
          account_id: (*id).into(),
          first_name: "Test".into(),
          last_name:  None,
        })
        .await
        .unwrap();
    }
    services
  }

  async fn place(svc: &Services<MemoryStore>, account_id: &str, n: usize) {
    for i in 0..n {
      svc
        .orders
        .place_order(account_id, &format!("{account_id}-order-{i}"))
        .await
        .unwrap();
    }
  }

  async fn business(svc: &Services<MemoryStore>, id: &str) {
    place(svc, id, UPGRADE_ORDER_THRESHOLD as usize).await;
    assert!(svc.hierarchy.upgrade_to_business(id).await.unwrap());
  }

  async fn link(svc: &Services<MemoryStore>, parent: &str, sub: &str) {
    let inv = svc
      .hierarchy
      .send_invitation(&Caller::new(parent), sub)
      .await
      .unwrap();
    svc
      .hierarchy
      .accept_invitation(&Caller::new(sub), inv.invitation_id, JoiningFrom::FromCreation)
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn upgrade_below_threshold_is_declined() {
    let svc = services_with(&["a"]).await;
    for n in 0..UPGRADE_ORDER_THRESHOLD {
      assert!(!svc.hierarchy.upgrade_to_business("a").await.unwrap());
      assert_eq!(
        svc.directory.get("a").await.unwrap().account_type,
        AccountType::Individual
      );
      svc.orders.place_order("a", &format!("o{n}")).await.unwrap();
    }
    assert!(svc.hierarchy.upgrade_to_business("a").await.unwrap());
  }

  #[tokio::test]
  async fn upgrade_at_threshold_then_again_fails() {
    let svc = services_with(&["a"]).await;
    place(&svc, "a", 10).await;

    assert!(svc.hierarchy.upgrade_to_business("a").await.unwrap());
    assert_eq!(
      svc.directory.get("a").await.unwrap().account_type,
      AccountType::Business
    );
    assert!(matches!(
      svc.hierarchy.upgrade_to_business("a").await,
      Err(Error::InvalidState(_))
    ));
  }

  #[tokio::test]
  async fn upgrade_unknown_account_is_not_found() {
    let svc = services_with(&[]).await;
    assert!(matches!(
      svc.hierarchy.upgrade_to_business("ghost").await,
      Err(Error::NotFound(_))
    ));
  }

  #[tokio::test]
  async fn sub_account_cannot_upgrade_even_with_orders() {
    let svc = services_with(&["p", "s"]).await;
    business(&svc, "p").await;
    link(&svc, "p", "s").await;
    place(&svc, "s", 12).await;

    assert!(matches!(
      svc.hierarchy.upgrade_to_business("s").await,
      Err(Error::InvalidState(_))
    ));
  }

  #[tokio::test]
  async fn unlink_self_resets_to_individual() {
    let svc = services_with(&["p", "s"]).await;
    business(&svc, "p").await;
    link(&svc, "p", "s").await;

    let s = svc.hierarchy.unlink_self("s").await.unwrap();
    assert_eq!(s.account_type, AccountType::Individual);
    assert!(s.parent_account_id.is_none());
    assert!(s.sub_account_history_from.is_none());
    assert_eq!(svc.directory.get("s").await.unwrap(), s);
  }

  #[tokio::test]
  async fn unlink_self_on_individual_fails_without_mutation() {
    let svc = services_with(&["a"]).await;
    let before = svc.directory.get("a").await.unwrap();
    assert!(matches!(
      svc.hierarchy.unlink_self("a").await,
      Err(Error::InvalidState(_))
    ));
    assert_eq!(svc.directory.get("a").await.unwrap(), before);
  }

  #[tokio::test]
  async fn unlink_by_parent_requires_own_sub_account() {
    let svc = services_with(&["p1", "p2", "s"]).await;
    business(&svc, "p1").await;
    business(&svc, "p2").await;
    link(&svc, "p1", "s").await;

    assert!(matches!(
      svc.hierarchy.unlink_by_parent("p2", "s").await,
      Err(Error::InvalidArgument(_))
    ));
    assert!(svc.directory.get("s").await.unwrap().is_linked_to("p1"));

    let s = svc.hierarchy.unlink_by_parent("p1", "s").await.unwrap();
    assert_eq!(s.account_type, AccountType::Individual);
    assert!(s.parent_account_id.is_none());
    assert!(s.sub_account_history_from.is_none());
  }

  #[tokio::test]
  async fn unlink_by_non_business_parent_fails() {
    let svc = services_with(&["p", "s", "x"]).await;
    business(&svc, "p").await;
    link(&svc, "p", "s").await;

    assert!(matches!(
      svc.hierarchy.unlink_by_parent("x", "s").await,
      Err(Error::InvalidState(_))
    ));
  }

  #[tokio::test]
  async fn unlinked_account_can_join_again() {
    let svc = services_with(&["p1", "p2", "s"]).await;
    business(&svc, "p1").await;
    business(&svc, "p2").await;
    link(&svc, "p1", "s").await;
    svc.hierarchy.unlink_self("s").await.unwrap();
    link(&svc, "p2", "s").await;

    let s = svc.directory.get("s").await.unwrap();
    assert!(s.is_linked_to("p2"));
    assert!(s.is_consistent());
  }
}
