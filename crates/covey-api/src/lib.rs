//! JSON HTTP API for Covey.
//!
//! Exposes an axum [`Router`] over [`Services`] backed by any
//! [`covey_core::store::Store`]. Requests other than `/login`, `POST
//! /accounts` and `/health` act as the account named by their bearer token.

pub mod error;
pub mod handlers;
pub mod identity;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use covey_core::{Services, store::Store};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{accounts, health, invitations, login, orders, sub_accounts};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `COVEY_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// SQLite database file, or `:memory:` for a throwaway database.
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("covey.sqlite3"),
    }
  }
}

impl ServerConfig {
  pub fn in_memory(&self) -> bool { self.store_path.as_os_str() == ":memory:" }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: Store> {
  pub services: Services<S>,
  pub config:   Arc<ServerConfig>,
}

impl<S: Store> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      services: self.services.clone(),
      config:   self.config.clone(),
    }
  }
}

impl<S: Store> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    Self {
      services: Services::new(store),
      config:   Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: Store + 'static,
{
  Router::new()
    .route("/health",                            get(health::handler))
    .route("/login",                             post(login::handler::<S>))
    // Accounts
    .route("/accounts",                          post(accounts::create::<S>))
    .route("/accounts/me",                       get(accounts::me::<S>))
    .route("/accounts/me/upgrade",               post(accounts::upgrade::<S>))
    // Invitations
    .route("/invitations",                       get(invitations::list::<S>))
    .route("/invitations/{id}",                  post(invitations::send::<S>))
    .route("/invitations/{id}/accept",           post(invitations::accept::<S>))
    .route("/invitations/{id}/reject",           post(invitations::reject::<S>))
    // Sub-accounts
    .route("/sub-accounts/unlink",               put(sub_accounts::unlink_self::<S>))
    .route("/sub-accounts/{sub_account_id}/unlink", put(sub_accounts::unlink::<S>))
    // Orders
    .route("/orders",                            post(orders::place::<S>))
    .route("/orders/history",                    get(orders::history::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use covey_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use crate::identity::issue_token;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(Arc::new(store), ServerConfig {
      store_path: PathBuf::from(":memory:"),
      ..ServerConfig::default()
    })
  }

  async fn call(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    as_account: Option<&str>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = as_account {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", issue_token(id)));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn create(state: &AppState<SqliteStore>, id: &str) {
    let resp = call(
      state,
      "POST",
      "/accounts",
      None,
      Some(json!({ "accountId": id, "firstName": "Test" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  async fn business(state: &AppState<SqliteStore>, id: &str) {
    create(state, id).await;
    for i in 0..10 {
      let resp = call(
        state,
        "POST",
        "/orders",
        Some(id),
        Some(json!({ "orderId": format!("{id}-{i}") })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::CREATED);
    }
    let resp = call(state, "POST", "/accounts/me/upgrade", Some(id), None).await;
    assert_eq!(json_body(resp).await, json!({ "upgraded": true }));
  }

  // ── Basics ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_is_ok() {
    let state = make_state().await;
    let resp = call(&state, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn create_account_then_login_and_fetch_me() {
    let state = make_state().await;
    create(&state, "ada@example.com").await;

    let resp = call(
      &state,
      "POST",
      "/login",
      None,
      Some(json!({ "accountId": "ada@example.com" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login = json_body(resp).await;
    let token = login["token"].as_str().unwrap().to_owned();
    assert_eq!(login["accountId"], "ada@example.com");

    let req = Request::builder()
      .uri("/accounts/me")
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await;
    assert_eq!(me["accountId"], "ada@example.com");
    assert_eq!(me["accountType"], "INDIVIDUAL");
    assert_eq!(me["parentAccountId"], Value::Null);
  }

  #[tokio::test]
  async fn duplicate_account_is_409_and_blank_is_400() {
    let state = make_state().await;
    create(&state, "a").await;
    let resp = call(
      &state,
      "POST",
      "/accounts",
      None,
      Some(json!({ "accountId": "a", "firstName": "Again" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(json_body(resp).await["error"].is_string());

    let resp = call(
      &state,
      "POST",
      "/accounts",
      None,
      Some(json!({ "accountId": "b", "firstName": " " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_or_unknown_identity_is_401() {
    let state = make_state().await;
    let resp = call(&state, "GET", "/accounts/me", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = call(&state, "GET", "/orders/history", Some("ghost"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = call(
      &state,
      "POST",
      "/login",
      None,
      Some(json!({ "accountId": "ghost" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Hierarchy flow ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upgrade_below_threshold_reports_false() {
    let state = make_state().await;
    create(&state, "a").await;
    let resp = call(&state, "POST", "/accounts/me/upgrade", Some("a"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "upgraded": false }));
  }

  #[tokio::test]
  async fn invite_accept_and_history() {
    let state = make_state().await;
    business(&state, "p").await;
    create(&state, "s").await;
    call(&state, "POST", "/orders", Some("s"), Some(json!({ "orderId": "s-early" }))).await;

    let resp = call(&state, "POST", "/invitations/s", Some("p"), None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let inv = json_body(resp).await;
    assert_eq!(inv["status"], "NO_ACTION");
    let id = inv["invitationId"].as_i64().unwrap();

    let resp = call(&state, "GET", "/invitations", Some("s"), None).await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

    let resp = call(
      &state,
      "POST",
      &format!("/invitations/{id}/accept"),
      Some("s"),
      Some(json!({ "joiningFrom": "FROM_INVITATION_ACCEPTANCE" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let s = json_body(resp).await;
    assert_eq!(s["accountType"], "SUBACCOUNT");
    assert_eq!(s["parentAccountId"], "p");
    assert!(s["subAccountHistoryFrom"].is_string());

    call(&state, "POST", "/orders", Some("s"), Some(json!({ "orderId": "s-late" }))).await;

    let resp = call(&state, "GET", "/orders/history", Some("p"), None).await;
    let history = json_body(resp).await;
    let ids: Vec<&str> = history
      .as_array()
      .unwrap()
      .iter()
      .map(|o| o["orderId"].as_str().unwrap())
      .collect();
    assert_eq!(ids.len(), 11);
    assert_eq!(ids[0], "s-late");
    assert!(!ids.contains(&"s-early"));

    // Already linked: a second accept is refused.
    let resp = call(
      &state,
      "POST",
      &format!("/invitations/{id}/accept"),
      Some("s"),
      Some(json!({ "joiningFrom": "FROM_CREATION" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = call(&state, "PUT", "/sub-accounts/s/unlink", Some("p"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["accountType"], "INDIVIDUAL");

    let resp = call(&state, "GET", "/orders/history", Some("p"), None).await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 10);
  }

  #[tokio::test]
  async fn invitation_errors_are_400() {
    let state = make_state().await;
    create(&state, "a").await;
    create(&state, "b").await;

    // Sender is not a business account.
    let resp = call(&state, "POST", "/invitations/b", Some("a"), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown invitation.
    let resp = call(&state, "POST", "/invitations/42/reject", Some("b"), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Not a sub-account.
    let resp = call(&state, "PUT", "/sub-accounts/unlink", Some("a"), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn reject_then_unlink_self() {
    let state = make_state().await;
    business(&state, "p1").await;
    business(&state, "p2").await;
    create(&state, "s").await;

    let first = json_body(call(&state, "POST", "/invitations/s", Some("p1"), None).await).await;
    let second = json_body(call(&state, "POST", "/invitations/s", Some("p2"), None).await).await;

    let resp = call(
      &state,
      "POST",
      &format!("/invitations/{}/reject", first["invitationId"]),
      Some("s"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "REJECTED");

    let resp = call(
      &state,
      "POST",
      &format!("/invitations/{}/accept", second["invitationId"]),
      Some("s"),
      Some(json!({ "joiningFrom": "FROM_CREATION" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&state, "PUT", "/sub-accounts/unlink", Some("s"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let s = json_body(resp).await;
    assert_eq!(s["accountType"], "INDIVIDUAL");
    assert_eq!(s["subAccountHistoryFrom"], Value::Null);
  }

  #[tokio::test]
  async fn duplicate_order_is_409() {
    let state = make_state().await;
    create(&state, "a").await;
    let body = json!({ "orderId": "o1" });
    let resp = call(&state, "POST", "/orders", Some("a"), Some(body.clone())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = call(&state, "POST", "/orders", Some("a"), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }
}
