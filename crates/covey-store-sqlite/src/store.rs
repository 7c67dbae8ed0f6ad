//! [`SqliteStore`] — the SQLite implementation of [`Store`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use covey_core::{
  account::{Account, AccountType},
  invitation::{Invitation, InvitationStatus},
  order::Order,
  store::{AccountStore, HistoryWindows, InvitationStore, OrderStore, Store},
};

use crate::{
  Result,
  encode::{
    ACCOUNT_COLUMNS, INVITATION_COLUMNS, RawAccount, RawInvitation, RawOrder,
    encode_account_type, encode_dt, encode_status,
  },
  error::Error,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Covey store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, for tests and `:memory:` servers.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-parameter order query and decode the rows.
  async fn query_orders(&self, sql: &'static str, param: String) -> Result<Vec<Order>> {
    let raws: Vec<RawOrder> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params![param], RawOrder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_order).collect()
  }
}

/// Column values of an invitation update, owned so they can cross into the
/// connection thread.
fn invitation_update(inv: &Invitation) -> (i64, &'static str, String) {
  (
    inv.invitation_id,
    encode_status(inv.status),
    encode_dt(inv.status_change_date),
  )
}

const UPDATE_INVITATION: &str =
  "UPDATE invitations SET status = ?2, status_change_date = ?3 WHERE invitation_id = ?1";

const RESOLVE_INVITATION: &str = "UPDATE invitations SET status = ?2, status_change_date = ?3 \
   WHERE invitation_id = ?1 AND status = 'NO_ACTION'";

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  async fn get_account(&self, account_id: &str) -> Result<Option<Account>> {
    let id = account_id.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
            rusqlite::params![id],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn account_exists(&self, account_id: &str) -> Result<bool> {
    let id = account_id.to_owned();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM accounts WHERE account_id = ?1",
            rusqlite::params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(exists)
  }

  async fn insert_account(&self, account: &Account) -> Result<bool> {
    let id          = account.account_id.clone();
    let first_name  = account.first_name.clone();
    let last_name   = account.last_name.clone();
    let kind        = encode_account_type(account.account_type);
    let parent      = account.parent_account_id.clone();
    let history     = account.sub_account_history_from.map(encode_dt);
    let created_str = encode_dt(account.creation_date);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!(
            "INSERT INTO accounts ({ACCOUNT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(account_id) DO NOTHING"
          ),
          rusqlite::params![id, first_name, last_name, kind, parent, history, created_str],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn put_account(&self, account: &Account) -> Result<()> {
    let id         = account.account_id.clone();
    let first_name = account.first_name.clone();
    let last_name  = account.last_name.clone();
    let kind       = encode_account_type(account.account_type);
    let parent     = account.parent_account_id.clone();
    let history    = account.sub_account_history_from.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE accounts
           SET first_name = ?2, last_name = ?3, account_type = ?4,
               parent_account_id = ?5, sub_account_history_from = ?6
           WHERE account_id = ?1",
          rusqlite::params![id, first_name, last_name, kind, parent, history],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_sub_accounts(&self, parent_account_id: &str) -> Result<Vec<Account>> {
    let parent = parent_account_id.to_owned();

    let raws: Vec<RawAccount> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACCOUNT_COLUMNS} FROM accounts
           WHERE parent_account_id = ?1 AND account_type = 'SUBACCOUNT'
           ORDER BY account_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![parent], RawAccount::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccount::into_account).collect()
  }
}

// ─── InvitationStore impl ────────────────────────────────────────────────────

impl InvitationStore for SqliteStore {
  type Error = Error;

  async fn get_invitation(&self, invitation_id: i64) -> Result<Option<Invitation>> {
    let raw: Option<RawInvitation> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {INVITATION_COLUMNS} FROM invitations WHERE invitation_id = ?1"),
            rusqlite::params![invitation_id],
            RawInvitation::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawInvitation::into_invitation).transpose()
  }

  async fn create_invitation(
    &self,
    parent_account_id: &str,
    sub_account_id: &str,
    at: DateTime<Utc>,
  ) -> Result<Invitation> {
    let parent = parent_account_id.to_owned();
    let sub    = sub_account_id.to_owned();
    let at_str = encode_dt(at);

    let invitation_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO invitations
             (parent_account_id, sub_account_id, status, invitation_date, status_change_date)
           VALUES (?1, ?2, 'NO_ACTION', ?3, ?3)",
          rusqlite::params![parent, sub, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Invitation {
      invitation_id,
      parent_account_id:  parent_account_id.to_owned(),
      sub_account_id:     sub_account_id.to_owned(),
      status:             InvitationStatus::NoAction,
      invitation_date:    at,
      status_change_date: at,
    })
  }

  async fn put_invitation(&self, invitation: &Invitation) -> Result<bool> {
    let (id, status, changed_at) = invitation_update(invitation);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(RESOLVE_INVITATION, rusqlite::params![id, status, changed_at])?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn put_invitations(&self, invitations: &[Invitation]) -> Result<()> {
    let updates: Vec<_> = invitations.iter().map(invitation_update).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPDATE_INVITATION)?;
          for (id, status, changed_at) in &updates {
            stmt.execute(rusqlite::params![id, status, changed_at])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_pending_by_sub_account(
    &self,
    sub_account_id: &str,
  ) -> Result<Vec<Invitation>> {
    let sub = sub_account_id.to_owned();

    let raws: Vec<RawInvitation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INVITATION_COLUMNS} FROM invitations
           WHERE sub_account_id = ?1 AND status = 'NO_ACTION'
           ORDER BY invitation_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![sub], RawInvitation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInvitation::into_invitation).collect()
  }
}

// ─── OrderStore impl ─────────────────────────────────────────────────────────

impl OrderStore for SqliteStore {
  type Error = Error;

  async fn insert_order(&self, order: &Order) -> Result<bool> {
    let order_id   = order.order_id.clone();
    let account_id = order.account_id.clone();
    let date_str   = encode_dt(order.order_date);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO orders (order_id, account_id, order_date) VALUES (?1, ?2, ?3)
           ON CONFLICT(order_id) DO NOTHING",
          rusqlite::params![order_id, account_id, date_str],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn count_by_account(&self, account_id: &str) -> Result<u64> {
    let id = account_id.to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM orders WHERE account_id = ?1",
          rusqlite::params![id],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  async fn find_by_account(&self, account_id: &str) -> Result<Vec<Order>> {
    self
      .query_orders(
        "SELECT order_id, account_id, order_date FROM orders WHERE account_id = ?1",
        account_id.to_owned(),
      )
      .await
  }

  async fn find_by_accounts_since(&self, windows: &HistoryWindows) -> Result<Vec<Order>> {
    let bounds: Vec<(String, String)> = windows
      .iter()
      .map(|(id, since)| (id.clone(), encode_dt(*since)))
      .collect();

    let raws: Vec<RawOrder> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT order_id, account_id, order_date FROM orders
           WHERE account_id = ?1 AND order_date >= ?2",
        )?;
        let mut rows = Vec::new();
        for (id, since) in &bounds {
          let batch = stmt
            .query_map(rusqlite::params![id, since], RawOrder::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows.extend(batch);
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_order).collect()
  }
}

// ─── Store impl ──────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  async fn link_sub_account(
    &self,
    account: &Account,
    invitations: &[Invitation],
  ) -> Result<bool> {
    let id      = account.account_id.clone();
    let kind    = encode_account_type(account.account_type);
    let parent  = account.parent_account_id.clone();
    let history = account.sub_account_history_from.map(encode_dt);
    let updates: Vec<_> = invitations.iter().map(invitation_update).collect();
    let individual = encode_account_type(AccountType::Individual);

    let linked = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE accounts
           SET account_type = ?2, parent_account_id = ?3, sub_account_history_from = ?4
           WHERE account_id = ?1 AND account_type = ?5",
          rusqlite::params![id, kind, parent, history, individual],
        )?;
        if changed == 0 {
          // Dropping the transaction rolls it back.
          return Ok(false);
        }
        {
          let mut stmt = tx.prepare(UPDATE_INVITATION)?;
          for (inv_id, status, changed_at) in &updates {
            stmt.execute(rusqlite::params![inv_id, status, changed_at])?;
          }
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;
    Ok(linked)
  }
}
