//! Bearer-token identity extractor.
//!
//! A token is the base64 encoding of an account id, issued by `POST /login`.
//! It names the acting account and nothing else; there is no session state.

use axum::{extract::FromRequestParts, http::{HeaderMap, header, request::Parts}};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use covey_core::{Caller, store::Store};

use crate::{AppState, error::ApiError};

/// Token for `account_id`.
pub fn issue_token(account_id: &str) -> String { B64.encode(account_id) }

/// The account id a token names, if it decodes.
pub fn decode_token(token: &str) -> Option<String> {
  let bytes = B64.decode(token.trim()).ok()?;
  String::from_utf8(bytes).ok().filter(|id| !id.is_empty())
}

/// Read the account id from an `Authorization: Bearer` header.
pub fn bearer_account_id(headers: &HeaderMap) -> Result<String, ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;
  let token = value.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
  decode_token(token).ok_or(ApiError::Unauthorized)
}

/// The authenticated caller of a request. Rejects with 401 unless the token
/// names an existing account.
pub struct Acting(pub Caller);

impl<S> FromRequestParts<AppState<S>> for Acting
where
  S: Store + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let account_id = bearer_account_id(&parts.headers)?;
    if !state.services.directory.exists(&account_id).await? {
      tracing::debug!(account_id, "token names unknown account");
      return Err(ApiError::Unauthorized);
    }
    Ok(Acting(Caller::new(account_id)))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn token_names_account() {
    let token = issue_token("grace@example.com");
    assert_eq!(decode_token(&token).as_deref(), Some("grace@example.com"));
    assert_eq!(
      bearer_account_id(&headers(&format!("Bearer {token}"))).unwrap(),
      "grace@example.com"
    );
  }

  #[test]
  fn malformed_headers_are_unauthorized() {
    assert!(matches!(
      bearer_account_id(&HeaderMap::new()),
      Err(ApiError::Unauthorized)
    ));
    let token = issue_token("a");
    assert!(matches!(
      bearer_account_id(&headers(&format!("Basic {token}"))),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      bearer_account_id(&headers("Bearer !!not-base64!!")),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      bearer_account_id(&headers("Bearer ")),
      Err(ApiError::Unauthorized)
    ));
  }
}
