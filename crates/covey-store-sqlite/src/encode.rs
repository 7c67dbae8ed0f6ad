//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed nanosecond width
//! and a `Z` suffix, so text comparison in SQL agrees with time order. Enums
//! use their wire names (`INDIVIDUAL`, `NO_ACTION`, ...).

use chrono::{DateTime, SecondsFormat, Utc};
use covey_core::{
  account::{Account, AccountType},
  invitation::{Invitation, InvitationStatus},
  order::Order,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_account_type(t: AccountType) -> &'static str {
  match t {
    AccountType::Individual => "INDIVIDUAL",
    AccountType::Business => "BUSINESS",
    AccountType::SubAccount => "SUBACCOUNT",
  }
}

pub fn decode_account_type(s: &str) -> Result<AccountType> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "account_type",
    value:  s.to_owned(),
  })
}

pub fn encode_status(s: InvitationStatus) -> &'static str {
  match s {
    InvitationStatus::NoAction => "NO_ACTION",
    InvitationStatus::Accepted => "ACCEPTED",
    InvitationStatus::Rejected => "REJECTED",
  }
}

pub fn decode_status(s: &str) -> Result<InvitationStatus> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "status",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str = "account_id, first_name, last_name, account_type, \
                                   parent_account_id, sub_account_history_from, creation_date";

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:               String,
  pub first_name:               String,
  pub last_name:                Option<String>,
  pub account_type:             String,
  pub parent_account_id:        Option<String>,
  pub sub_account_history_from: Option<String>,
  pub creation_date:            String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:               row.get(0)?,
      first_name:               row.get(1)?,
      last_name:                row.get(2)?,
      account_type:             row.get(3)?,
      parent_account_id:        row.get(4)?,
      sub_account_history_from: row.get(5)?,
      creation_date:            row.get(6)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:               self.account_id,
      first_name:               self.first_name,
      last_name:                self.last_name,
      account_type:             decode_account_type(&self.account_type)?,
      parent_account_id:        self.parent_account_id,
      sub_account_history_from: self
        .sub_account_history_from
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      creation_date:            decode_dt(&self.creation_date)?,
    })
  }
}

pub const INVITATION_COLUMNS: &str = "invitation_id, parent_account_id, sub_account_id, \
                                      status, invitation_date, status_change_date";

/// Raw values read directly from an `invitations` row.
pub struct RawInvitation {
  pub invitation_id:      i64,
  pub parent_account_id:  String,
  pub sub_account_id:     String,
  pub status:             String,
  pub invitation_date:    String,
  pub status_change_date: String,
}

impl RawInvitation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      invitation_id:      row.get(0)?,
      parent_account_id:  row.get(1)?,
      sub_account_id:     row.get(2)?,
      status:             row.get(3)?,
      invitation_date:    row.get(4)?,
      status_change_date: row.get(5)?,
    })
  }

  pub fn into_invitation(self) -> Result<Invitation> {
    Ok(Invitation {
      invitation_id:      self.invitation_id,
      parent_account_id:  self.parent_account_id,
      sub_account_id:     self.sub_account_id,
      status:             decode_status(&self.status)?,
      invitation_date:    decode_dt(&self.invitation_date)?,
      status_change_date: decode_dt(&self.status_change_date)?,
    })
  }
}

/// Raw strings read directly from an `orders` row.
pub struct RawOrder {
  pub order_id:   String,
  pub account_id: String,
  pub order_date: String,
}

impl RawOrder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:   row.get(0)?,
      account_id: row.get(1)?,
      order_date: row.get(2)?,
    })
  }

  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      order_id:   self.order_id,
      account_id: self.account_id,
      order_date: decode_dt(&self.order_date)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_as_text() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + Duration::nanoseconds(1);
    let c = a + Duration::milliseconds(150);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn enum_names_match_wire_names() {
    for t in [AccountType::Individual, AccountType::Business, AccountType::SubAccount] {
      assert_eq!(decode_account_type(encode_account_type(t)).unwrap(), t);
      assert_eq!(encode_account_type(t), t.to_string());
    }
    for s in [
      InvitationStatus::NoAction,
      InvitationStatus::Accepted,
      InvitationStatus::Rejected,
    ] {
      assert_eq!(decode_status(encode_status(s)).unwrap(), s);
    }
    assert!(matches!(
      decode_status("PENDING"),
      Err(Error::UnknownValue { column: "status", .. })
    ));
  }
}
