//! Handlers for `/invitations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/invitations/{id}` | `id` is the invitee; sent by the acting business account |
//! | `GET`  | `/invitations` | Pending invitations addressed to the acting account |
//! | `POST` | `/invitations/{id}/accept` | Body: `{"joiningFrom":"FROM_CREATION"}` |
//! | `POST` | `/invitations/{id}/reject` | |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use covey_core::{
  account::Account,
  invitation::{Invitation, JoiningFrom},
  store::Store,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, identity::Acting};

pub async fn send<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
  Path(sub_account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let invitation = state
    .services
    .hierarchy
    .send_invitation(&caller, &sub_account_id)
    .await?;
  Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn list<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
) -> Result<Json<Vec<Invitation>>, ApiError>
where
  S: Store + 'static,
{
  let pending = state
    .services
    .ledger
    .list_pending(caller.account_id())
    .await?;
  Ok(Json(pending))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptBody {
  pub joining_from: JoiningFrom,
}

pub async fn accept<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
  Path(invitation_id): Path<i64>,
  Json(body): Json<AcceptBody>,
) -> Result<Json<Account>, ApiError>
where
  S: Store + 'static,
{
  let account = state
    .services
    .hierarchy
    .accept_invitation(&caller, invitation_id, body.joining_from)
    .await?;
  Ok(Json(account))
}

pub async fn reject<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
  Path(invitation_id): Path<i64>,
) -> Result<Json<Invitation>, ApiError>
where
  S: Store + 'static,
{
  let invitation = state
    .services
    .hierarchy
    .reject_invitation(&caller, invitation_id)
    .await?;
  Ok(Json(invitation))
}
