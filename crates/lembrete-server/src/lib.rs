//! HTTP server wiring for Lembrete.
//!
//! Mounts the JSON API under `/api` behind HTTP Basic auth, adds request
//! tracing, and logs every change event the service publishes.

pub mod auth;
pub mod error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use lembrete_core::{
  events::ChangeEvent,
  schedule::{DEFAULT_DUE_DAY, DEFAULT_POSTPONE_DAYS},
  service::{PlanService, ScheduleDefaults},
  store::PlanStore,
};
use serde::Deserialize;
use tokio::{sync::broadcast, task::JoinHandle};
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

pub use error::Error;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LEMBRETE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Basic auth is disabled when empty.
  pub auth_username:         String,
  pub auth_password_hash:    String,
  pub default_due_day:       u32,
  pub default_postpone_days: u32,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "127.0.0.1".to_string(),
      port:                  5480,
      store_path:            PathBuf::from("~/.local/share/lembrete/lembrete.db"),
      auth_username:         String::new(),
      auth_password_hash:    String::new(),
      default_due_day:       DEFAULT_DUE_DAY,
      default_postpone_days: DEFAULT_POSTPONE_DAYS,
    }
  }
}

impl ServerConfig {
  pub fn schedule_defaults(&self) -> ScheduleDefaults {
    ScheduleDefaults {
      due_day:       self.default_due_day,
      postpone_days: self.default_postpone_days,
    }
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/api/*` behind auth, `/health` open.
pub fn router<S>(service: Arc<PlanService<S>>, auth: AuthConfig) -> Router
where
  S: PlanStore + 'static,
{
  let api = lembrete_api::api_router(service)
    .layer(middleware::from_fn_with_state(Arc::new(auth), auth::require_auth));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Change log ───────────────────────────────────────────────────────────────

/// Log every change event until the bus closes.
pub fn spawn_change_logger(mut rx: broadcast::Receiver<ChangeEvent>) -> JoinHandle<()> {
  tokio::spawn(async move {
    loop {
      match rx.recv().await {
        Ok(event) => tracing::debug!(
          kind = ?event.kind,
          record_id = ?event.record_id,
          action = ?event.action,
          "record changed"
        ),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          tracing::warn!(skipped, "change log fell behind");
        }
        Err(broadcast::error::RecvError::Closed) => break,
      }
    }
  })
}

// ─── Integration tests ────────────────────────────────────────────────────────
