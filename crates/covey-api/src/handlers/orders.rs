//! Handlers for `/orders` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/orders` | Body: `{"orderId":"…"}`; dated now |
//! | `GET`  | `/orders/history` | Own orders plus shared sub-account orders, newest first |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use covey_core::{order::Order, store::Store};
use serde::Deserialize;

use crate::{AppState, error::ApiError, identity::Acting};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBody {
  pub order_id: String,
}

pub async fn place<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
  Json(body): Json<PlaceBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let order = state
    .services
    .orders
    .place_order(caller.account_id(), &body.order_id)
    .await?;
  Ok((StatusCode::CREATED, Json(order)))
}

pub async fn history<S>(
  State(state): State<AppState<S>>,
  Acting(caller): Acting,
) -> Result<Json<Vec<Order>>, ApiError>
where
  S: Store + 'static,
{
  let orders = state.services.orders.history(caller.account_id()).await?;
  Ok(Json(orders))
}
