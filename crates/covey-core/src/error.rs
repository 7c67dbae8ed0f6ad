//! Error types for `covey-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A reference that does not resolve, or a value inconsistent with the
  /// request.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// The target entity's current state forbids the requested transition.
  #[error("invalid state: {0}")]
  InvalidState(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
