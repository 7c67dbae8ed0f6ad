//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler or extractor.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<covey_core::Error> for ApiError {
  fn from(e: covey_core::Error) -> Self {
    use covey_core::Error as E;
    match e {
      E::InvalidArgument(_) | E::InvalidState(_) => ApiError::BadRequest(e.to_string()),
      E::NotFound(m) => ApiError::NotFound(m),
      E::Conflict(m) => ApiError::Conflict(m),
      E::Store(inner) => ApiError::Store(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::warn!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"covey\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (covey_core::Error::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
      (covey_core::Error::InvalidState("x".into()), StatusCode::BAD_REQUEST),
      (covey_core::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
      (covey_core::Error::Conflict("x".into()), StatusCode::CONFLICT),
      (
        covey_core::Error::store(std::io::Error::other("disk")),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
