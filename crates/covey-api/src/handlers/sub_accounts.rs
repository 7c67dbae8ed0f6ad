//! `PUT /sub-accounts/unlink` leaves the acting account's parent;
//! `PUT /sub-accounts/{subAccountId}/unlink` releases one of the acting
//! business account's sub-accounts.

use axum::{
  Json,
  extract::{Path, State},
};
use covey_core::{account::Account, store::Store};

use crate::{AppState, error::ApiError, identity::Acting};

pub async fn unlink_self<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
) -> Result<Json<Account>, ApiError>
where
  S: Store + 'static,
{
  let account = state
    .services
    .hierarchy
    .unlink_self(caller.account_id())
    .await?;
  Ok(Json(account))
}

pub async fn unlink<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
  Path(sub_account_id): Path<String>,
) -> Result<Json<Account>, ApiError>
where
  S: Store + 'static,
{
  let account = state
    .services
    .hierarchy
    .unlink_by_parent(caller.account_id(), &sub_account_id)
    .await?;
  Ok(Json(account))
}
