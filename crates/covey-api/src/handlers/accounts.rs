//! Handlers for `/accounts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/accounts` | Body: `{"accountId","firstName","lastName"?}`; no token |
//! | `GET`  | `/accounts/me` | The acting account |
//! | `POST` | `/accounts/me/upgrade` | `{"upgraded":false}` below the order threshold |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use covey_core::{
  account::{Account, NewAccount},
  store::Store,
};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, identity::Acting};

// ─── Create ───────────────────────────────────────────────────────────────────

pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewAccount>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let account = state.services.directory.create(body).await?;
  Ok((StatusCode::CREATED, Json(account)))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

pub async fn me<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
) -> Result<Json<Account>, ApiError>
where
  S: Store + 'static,
{
  let account = state.services.directory.get(caller.account_id()).await?;
  Ok(Json(account))
}

// ─── Upgrade ──────────────────────────────────────────────────────────────────

pub async fn upgrade<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
) -> Result<Json<Value>, ApiError>
where
  S: Store + 'static,
{
  let upgraded = state
    .services
    .hierarchy
    .upgrade_to_business(caller.account_id())
    .await?;
  Ok(Json(json!({ "upgraded": upgraded })))
}
