//! Accounts and the three-state hierarchy machine.
//!
//! ```text
//! INDIVIDUAL --(>=10 orders, upgrade)--> BUSINESS
//! INDIVIDUAL --(accept invitation)-----> SUBACCOUNT
//! SUBACCOUNT --(unlink self/parent)----> INDIVIDUAL
//! ```
//!
//! Every edge has exactly one transition method on [`Account`]. Anything not
//! drawn above is refused with [`Error::InvalidState`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// The form an account currently takes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum AccountType {
  #[default]
  #[serde(rename = "INDIVIDUAL")]
  #[strum(serialize = "INDIVIDUAL")]
  Individual,
  #[serde(rename = "BUSINESS")]
  #[strum(serialize = "BUSINESS")]
  Business,
  #[serde(rename = "SUBACCOUNT")]
  #[strum(serialize = "SUBACCOUNT")]
  SubAccount,
}

/// A customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  pub account_id:               String,
  pub first_name:               String,
  pub last_name:                Option<String>,
  pub account_type:             AccountType,
  /// The owning business account; present iff `account_type` is
  /// [`AccountType::SubAccount`].
  pub parent_account_id:        Option<String>,
  /// Earliest order date the parent may see; present iff sub-account.
  pub sub_account_history_from: Option<DateTime<Utc>>,
  pub creation_date:            DateTime<Utc>,
}

/// Input to [`crate::directory::AccountDirectory::create`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
  pub account_id: String,
  pub first_name: String,
  pub last_name:  Option<String>,
}

impl Account {
  /// A fresh individual account created at `creation_date`.
  pub fn new(input: NewAccount, creation_date: DateTime<Utc>) -> Self {
    Self {
      account_id: input.account_id,
      first_name: input.first_name,
      last_name: input.last_name,
      account_type: AccountType::Individual,
      parent_account_id: None,
      sub_account_history_from: None,
      creation_date,
    }
  }

  /// Whether the type, parent link and history cutoff agree with each other.
  pub fn is_consistent(&self) -> bool {
    let linked = self.parent_account_id.is_some();
    let cutoff = self.sub_account_history_from.is_some();
    match self.account_type {
      AccountType::SubAccount => linked && cutoff,
      AccountType::Individual | AccountType::Business => !linked && !cutoff,
    }
  }

  /// INDIVIDUAL → BUSINESS. The order-count policy is checked by the caller.
  pub fn upgrade_to_business(&mut self) -> Result<()> {
    if self.account_type != AccountType::Individual {
      return Err(Error::InvalidState(format!(
        "account {} is either already a business account or a sub account",
        self.account_id
      )));
    }
    self.account_type = AccountType::Business;
    Ok(())
  }

  /// INDIVIDUAL → SUBACCOUNT of `parent_account_id`.
  pub fn link_to(
    &mut self,
    parent_account_id: &str,
    history_from: DateTime<Utc>,
  ) -> Result<()> {
    if self.account_type != AccountType::Individual {
      return Err(Error::InvalidState(format!(
        "account {} is already a {} account",
        self.account_id, self.account_type
      )));
    }
    self.account_type = AccountType::SubAccount;
    self.parent_account_id = Some(parent_account_id.to_owned());
    self.sub_account_history_from = Some(history_from);
    Ok(())
  }

  /// SUBACCOUNT → INDIVIDUAL, clearing the parent link and cutoff.
  pub fn unlink(&mut self) -> Result<()> {
    if self.account_type != AccountType::SubAccount {
      return Err(Error::InvalidState(format!(
        "account {} is not a sub account",
        self.account_id
      )));
    }
    self.account_type = AccountType::Individual;
    self.parent_account_id = None;
    self.sub_account_history_from = None;
    Ok(())
  }

  pub fn is_linked_to(&self, parent_account_id: &str) -> bool {
    self.parent_account_id.as_deref() == Some(parent_account_id)
  }
}
