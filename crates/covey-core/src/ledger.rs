//! [`InvitationLedger`]: creation and resolution of sub-account invitations.
//!
//! Every operation that reads or writes the invitations addressed to an
//! account runs under that account's lock. Acceptance links the account and
//! resolves all of its pending invitations through one
//! [`Store::link_sub_account`] call.

use std::sync::Arc;

use chrono::Utc;

use crate::{
  Caller, Error, Result,
  account::{Account, AccountType},
  directory::AccountDirectory,
  invitation::{Invitation, InvitationStatus, JoiningFrom},
  lock::AccountLocks,
  store::Store,
};

pub struct InvitationLedger<S: Store> {
  store:     Arc<S>,
  directory: AccountDirectory<S>,
  locks:     Arc<AccountLocks>,
}

impl<S: Store> Clone for InvitationLedger<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      directory: self.directory.clone(),
      locks:     self.locks.clone(),
    }
  }
}

impl<S: Store> InvitationLedger<S> {
  pub fn new(
    store: Arc<S>,
    directory: AccountDirectory<S>,
    locks: Arc<AccountLocks>,
  ) -> Self {
    Self { store, directory, locks }
  }

  /// Invite `sub_account_id` to join `parent_account_id`.
  ///
  /// Both sides are validated and every failure is reported together: the
  /// invitee must exist and not already be a sub-account, the sender must be
  /// a business account.
  pub async fn send(
    &self,
    parent_account_id: &str,
    sub_account_id: &str,
  ) -> Result<Invitation> {
    let _guard = self.locks.lock(sub_account_id).await;

    let mut problems = Vec::new();

    match self.directory.find(sub_account_id).await? {
      None => problems.push(format!("invalid sub account id {sub_account_id}")),
      Some(sub) if sub.account_type == AccountType::SubAccount => {
        problems.push(format!("account {sub_account_id} is already a sub account"))
      }
      Some(_) => {}
    }

    match self.directory.find(parent_account_id).await? {
      None => {
        problems.push(format!("invalid parent account id {parent_account_id}"))
      }
      Some(parent) if parent.account_type != AccountType::Business => {
        problems.push(format!(
          "account {parent_account_id} is not a business account and cannot send invitations"
        ))
      }
      Some(_) => {}
    }

    if !problems.is_empty() {
      return Err(Error::InvalidArgument(problems.join("; ")));
    }

    let invitation = self
      .store
      .create_invitation(parent_account_id, sub_account_id, Utc::now())
      .await
      .map_err(Error::store)?;

    tracing::info!(
      invitation_id = invitation.invitation_id,
      parent = parent_account_id,
      sub = sub_account_id,
      "invitation sent"
    );
    Ok(invitation)
  }

  /// Pending invitations addressed to `account_id`, oldest first.
  pub async fn list_pending(&self, account_id: &str) -> Result<Vec<Invitation>> {
    self
      .store
      .find_pending_by_sub_account(account_id)
      .await
      .map_err(Error::store)
  }

  pub async fn get(&self, invitation_id: i64) -> Result<Option<Invitation>> {
    self
      .store
      .get_invitation(invitation_id)
      .await
      .map_err(Error::store)
  }

  /// Accept an invitation on behalf of its addressee.
  ///
  /// Returns the account as linked. Sibling invitations still pending for the
  /// same account are rejected with the same timestamp.
  pub async fn accept(
    &self,
    caller: &Caller,
    invitation_id: i64,
    joining_from: JoiningFrom,
  ) -> Result<Account> {
    let sub_account_id = caller.account_id();
    let _guard = self.locks.lock(sub_account_id).await;

    let invitation = self.addressed_to(caller, invitation_id).await?;
    let mut account = self.individual(sub_account_id).await?;
    if !invitation.is_pending() {
      return Err(Error::InvalidState(format!(
        "invitation {invitation_id} is already {}",
        invitation.status
      )));
    }

    let now = Utc::now();
    let cutoff = joining_from.cutoff(&account, now);
    account.link_to(&invitation.parent_account_id, cutoff)?;

    let mut resolved = self
      .store
      .find_pending_by_sub_account(sub_account_id)
      .await
      .map_err(Error::store)?;
    for inv in &mut resolved {
      let status = if inv.invitation_id == invitation_id {
        InvitationStatus::Accepted
      } else {
        InvitationStatus::Rejected
      };
      inv.resolve(status, now)?;
    }

    let linked = self
      .store
      .link_sub_account(&account, &resolved)
      .await
      .map_err(Error::store)?;
    if !linked {
      return Err(Error::InvalidState(format!(
        "account {sub_account_id} is no longer an individual account"
      )));
    }

    tracing::info!(
      invitation_id,
      parent = %invitation.parent_account_id,
      sub = sub_account_id,
      rejected_siblings = resolved.len().saturating_sub(1),
      "invitation accepted"
    );
    Ok(account)
  }

  /// Reject a single invitation; siblings are left untouched.
  pub async fn reject(
    &self,
    caller: &Caller,
    invitation_id: i64,
  ) -> Result<Invitation> {
    let sub_account_id = caller.account_id();
    let _guard = self.locks.lock(sub_account_id).await;

    let mut invitation = self.addressed_to(caller, invitation_id).await?;
    self.individual(sub_account_id).await?;

    invitation.resolve(InvitationStatus::Rejected, Utc::now())?;
    let written = self
      .store
      .put_invitation(&invitation)
      .await
      .map_err(Error::store)?;
    if !written {
      return Err(Error::InvalidState(format!(
        "invitation {invitation_id} is already resolved"
      )));
    }

    tracing::info!(invitation_id, sub = sub_account_id, "invitation rejected");
    Ok(invitation)
  }

  /// Resolve an invitation and check the caller is its addressee.
  async fn addressed_to(
    &self,
    caller: &Caller,
    invitation_id: i64,
  ) -> Result<Invitation> {
    self
      .get(invitation_id)
      .await?
      .filter(|inv| inv.sub_account_id == caller.account_id())
      .ok_or_else(|| {
        Error::InvalidArgument(format!(
          "either null or invalid invitation id {invitation_id}"
        ))
      })
  }

  /// Load `account_id`, requiring it to be `INDIVIDUAL`.
  async fn individual(&self, account_id: &str) -> Result<Account> {
    let account = self.directory.get(account_id).await?;
    if account.account_type != AccountType::Individual {
      return Err(Error::InvalidState(format!(
        "account {account_id} is already a {} account",
        account.account_type
      )));
    }
    Ok(account)
  }
}
