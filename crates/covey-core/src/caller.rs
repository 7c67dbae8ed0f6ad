//! The acting account behind a single request.

use std::fmt;

/// Identity of the account performing an operation.
///
/// Built once per request by the transport layer and passed explicitly to
/// every operation that acts on the caller's behalf. The core treats the id
/// as opaque and already validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caller {
  account_id: String,
}

impl Caller {
  pub fn new(account_id: impl Into<String>) -> Self {
    Self { account_id: account_id.into() }
  }

  pub fn account_id(&self) -> &str { &self.account_id }
}

impl fmt::Display for Caller {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.account_id)
  }
}
