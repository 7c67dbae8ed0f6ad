//! Sub-account invitations.
//!
//! An invitation is created in [`InvitationStatus::NoAction`] and resolved at
//! most once, either explicitly or as a side effect of a sibling invitation
//! being accepted. Invitations are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, account::Account};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
  #[default]
  NoAction,
  Accepted,
  Rejected,
}

/// An offer from a business account to an individual account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
  /// Store-assigned; increases with creation order.
  pub invitation_id:      i64,
  pub parent_account_id:  String,
  pub sub_account_id:     String,
  pub status:             InvitationStatus,
  pub invitation_date:    DateTime<Utc>,
  pub status_change_date: DateTime<Utc>,
}

impl Invitation {
  pub fn is_pending(&self) -> bool {
    self.status == InvitationStatus::NoAction
  }

  /// Move a pending invitation to `status`, stamping `at`.
  pub fn resolve(
    &mut self,
    status: InvitationStatus,
    at: DateTime<Utc>,
  ) -> Result<()> {
    if !self.is_pending() {
      return Err(Error::InvalidState(format!(
        "invitation {} is already {}",
        self.invitation_id, self.status
      )));
    }
    if status == InvitationStatus::NoAction {
      return Err(Error::InvalidArgument(
        "an invitation cannot be resolved back to NO_ACTION".into(),
      ));
    }
    self.status = status;
    self.status_change_date = at;
    Ok(())
  }
}

/// Which of the sub-account's orders become visible to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoiningFrom {
  /// Everything since the sub-account was created.
  FromCreation,
  /// Only orders placed from the moment of acceptance.
  FromInvitationAcceptance,
}

impl JoiningFrom {
  /// The history cutoff for `account` accepting at `accepted_at`.
  pub fn cutoff(
    self,
    account: &Account,
    accepted_at: DateTime<Utc>,
  ) -> DateTime<Utc> {
    match self {
      Self::FromCreation => account.creation_date,
      Self::FromInvitationAcceptance => accepted_at,
    }
  }
}
