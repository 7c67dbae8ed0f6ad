//! `POST /login`, body: `{"accountId":"…"}`
//!
//! Issues a bearer token for an existing account. No password is involved;
//! this only establishes which account subsequent requests act as.

use axum::{Json, extract::State};
use covey_core::store::Store;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, identity::issue_token};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
  pub account_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token:      String,
  pub account_id: String,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: Store + 'static,
{
  if !state.services.directory.exists(&body.account_id).await? {
    return Err(ApiError::Unauthorized);
  }
  tracing::info!(account_id = %body.account_id, "login");
  Ok(Json(LoginResponse {
    token:      issue_token(&body.account_id),
    account_id: body.account_id,
  }))
}
