//! [`MemoryStore`] — an in-process implementation of [`Store`].
//!
//! All three tables sit behind one [`RwLock`], so every trait call, including
//! [`Store::link_sub_account`], is a single critical section.

use std::{
  collections::BTreeMap,
  convert::Infallible,
  sync::Arc,
};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
  account::{Account, AccountType},
  invitation::{Invitation, InvitationStatus},
  order::Order,
  store::{AccountStore, HistoryWindows, InvitationStore, OrderStore, Store},
};

#[derive(Debug, Default)]
struct Tables {
  accounts:           BTreeMap<String, Account>,
  invitations:        BTreeMap<i64, Invitation>,
  last_invitation_id: i64,
  /// Insertion order.
  orders:             Vec<Order>,
}

/// Volatile store for tests and throwaway servers.
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl AccountStore for MemoryStore {
  type Error = Infallible;

  async fn get_account(&self, account_id: &str) -> Result<Option<Account>, Infallible> {
    Ok(self.tables.read().await.accounts.get(account_id).cloned())
  }

  async fn account_exists(&self, account_id: &str) -> Result<bool, Infallible> {
    Ok(self.tables.read().await.accounts.contains_key(account_id))
  }

  async fn insert_account(&self, account: &Account) -> Result<bool, Infallible> {
    let mut tables = self.tables.write().await;
    if tables.accounts.contains_key(&account.account_id) {
      return Ok(false);
    }
    tables
      .accounts
      .insert(account.account_id.clone(), account.clone());
    Ok(true)
  }

  async fn put_account(&self, account: &Account) -> Result<(), Infallible> {
    self
      .tables
      .write()
      .await
      .accounts
      .insert(account.account_id.clone(), account.clone());
    Ok(())
  }

  async fn list_sub_accounts(
    &self,
    parent_account_id: &str,
  ) -> Result<Vec<Account>, Infallible> {
    Ok(
      self
        .tables
        .read()
        .await
        .accounts
        .values()
        .filter(|a| a.is_linked_to(parent_account_id))
        .cloned()
        .collect(),
    )
  }
}

impl InvitationStore for MemoryStore {
  type Error = Infallible;

  async fn get_invitation(&self, invitation_id: i64) -> Result<Option<Invitation>, Infallible> {
    Ok(self.tables.read().await.invitations.get(&invitation_id).cloned())
  }

  async fn create_invitation(
    &self,
    parent_account_id: &str,
    sub_account_id: &str,
    at: DateTime<Utc>,
  ) -> Result<Invitation, Infallible> {
    let mut tables = self.tables.write().await;
    tables.last_invitation_id += 1;
    let invitation = Invitation {
      invitation_id:      tables.last_invitation_id,
      parent_account_id:  parent_account_id.to_owned(),
      sub_account_id:     sub_account_id.to_owned(),
      status:             InvitationStatus::NoAction,
      invitation_date:    at,
      status_change_date: at,
    };
    tables
      .invitations
      .insert(invitation.invitation_id, invitation.clone());
    Ok(invitation)
  }

  async fn put_invitation(&self, invitation: &Invitation) -> Result<bool, Infallible> {
    let mut tables = self.tables.write().await;
    match tables.invitations.get_mut(&invitation.invitation_id) {
      Some(stored) if stored.is_pending() => {
        *stored = invitation.clone();
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn put_invitations(&self, invitations: &[Invitation]) -> Result<(), Infallible> {
    let mut tables = self.tables.write().await;
    for inv in invitations {
      tables.invitations.insert(inv.invitation_id, inv.clone());
    }
    Ok(())
  }

  async fn find_pending_by_sub_account(
    &self,
    sub_account_id: &str,
  ) -> Result<Vec<Invitation>, Infallible> {
    Ok(
      self
        .tables
        .read()
        .await
        .invitations
        .values()
        .filter(|i| i.sub_account_id == sub_account_id && i.is_pending())
        .cloned()
        .collect(),
    )
  }
}

impl OrderStore for MemoryStore {
  type Error = Infallible;

  async fn insert_order(&self, order: &Order) -> Result<bool, Infallible> {
    let mut tables = self.tables.write().await;
    if tables.orders.iter().any(|o| o.order_id == order.order_id) {
      return Ok(false);
    }
    tables.orders.push(order.clone());
    Ok(true)
  }

  async fn count_by_account(&self, account_id: &str) -> Result<u64, Infallible> {
    let tables = self.tables.read().await;
    Ok(tables.orders.iter().filter(|o| o.account_id == account_id).count() as u64)
  }

  async fn find_by_account(&self, account_id: &str) -> Result<Vec<Order>, Infallible> {
    Ok(
      self
        .tables
        .read()
        .await
        .orders
        .iter()
        .filter(|o| o.account_id == account_id)
        .cloned()
        .collect(),
    )
  }

  async fn find_by_accounts_since(
    &self,
    windows: &HistoryWindows,
  ) -> Result<Vec<Order>, Infallible> {
    Ok(
      self
        .tables
        .read()
        .await
        .orders
        .iter()
        .filter(|o| {
          windows
            .get(&o.account_id)
            .is_some_and(|since| o.order_date >= *since)
        })
        .cloned()
        .collect(),
    )
  }
}

impl Store for MemoryStore {
  async fn link_sub_account(
    &self,
    account: &Account,
    invitations: &[Invitation],
  ) -> Result<bool, Infallible> {
    let mut tables = self.tables.write().await;
    let still_individual = tables
      .accounts
      .get(&account.account_id)
      .is_some_and(|a| a.account_type == AccountType::Individual);
    if !still_individual {
      return Ok(false);
    }
    tables
      .accounts
      .insert(account.account_id.clone(), account.clone());
    for inv in invitations {
      tables.invitations.insert(inv.invitation_id, inv.clone());
    }
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  #[tokio::test]
  async fn put_invitation_leaves_resolved_rows_alone() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let inv = store.create_invitation("p", "s", now).await.unwrap();

    let mut accepted = inv.clone();
    accepted.resolve(InvitationStatus::Accepted, now).unwrap();
    assert!(store.put_invitation(&accepted).await.unwrap());

    let mut late = inv.clone();
    late.resolve(InvitationStatus::Rejected, now + Duration::seconds(1)).unwrap();
    assert!(!store.put_invitation(&late).await.unwrap());
    assert_eq!(
      store.get_invitation(inv.invitation_id).await.unwrap(),
      Some(accepted)
    );
  }

  #[tokio::test]
  async fn put_invitation_of_unknown_id_writes_nothing() {
    let store = MemoryStore::new();
    let mut inv = store.create_invitation("p", "s", Utc::now()).await.unwrap();
    inv.invitation_id += 1;
    inv.resolve(InvitationStatus::Rejected, Utc::now()).unwrap();

    assert!(!store.put_invitation(&inv).await.unwrap());
    assert!(store.get_invitation(inv.invitation_id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn put_invitations_writes_every_row() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let mut a = store.create_invitation("p1", "s", now).await.unwrap();
    let mut b = store.create_invitation("p2", "s", now).await.unwrap();

    let at = now + Duration::seconds(3);
    a.resolve(InvitationStatus::Rejected, at).unwrap();
    b.resolve(InvitationStatus::Accepted, at).unwrap();
    store.put_invitations(&[a.clone(), b.clone()]).await.unwrap();

    assert_eq!(store.get_invitation(a.invitation_id).await.unwrap(), Some(a));
    assert_eq!(store.get_invitation(b.invitation_id).await.unwrap(), Some(b));
    assert!(store.find_pending_by_sub_account("s").await.unwrap().is_empty());
  }
}
