//! Handlers for payment-plan endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/plans` | Optional [`PlanQuery`] filters |
//! | `POST`   | `/plans` | Body: [`NewPlan`]; returns 201 + created installments |
//! | `GET`    | `/plans/:id` | 404 if not found |
//! | `DELETE` | `/plans/:id` | Removes one installment record |
//! | `POST`   | `/plans/:id/pay` | Returns [`PayResponse`] |
//! | `POST`   | `/plans/:id/postpone` | Body: `{"days":n}` (optional) |
//! | `DELETE` | `/series/:id` | Removes every installment of a series |
//! | `GET`    | `/plan-set` | `?category=general\|analysis`, default `general` |
//! | `POST`   | `/cleanup` | Drops plans whose client has no appointment |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use lembrete_core::{
  lifecycle::MarkPaid,
  plan::{NewPlan, PaymentPlan, PlanCategory},
  query::PlanQuery,
  service::PlanService,
  store::PlanStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;

type Service<S> = State<Arc<PlanService<S>>>;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /plans[?client=..][&due_from=..][&due_to=..][&active=..][&category=..][&limit=..][&offset=..]`
pub async fn list<S: PlanStore>(
  State(service): Service<S>,
  Query(query): Query<PlanQuery>,
) -> Result<Json<Vec<PaymentPlan>>, ApiError> {
  Ok(Json(service.list_plans(&query).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /plans` — returns 201 + every installment record created.
pub async fn create<S: PlanStore>(
  State(service): Service<S>,
  Json(body): Json<NewPlan>,
) -> Result<impl IntoResponse, ApiError> {
  let created = service.activate_plan(body).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Get / delete one ─────────────────────────────────────────────────────────

/// `GET /plans/:id`
pub async fn get_one<S: PlanStore>(
  State(service): Service<S>,
  Path(id): Path<Uuid>,
) -> Result<Json<PaymentPlan>, ApiError> {
  Ok(Json(service.get_plan(id).await?))
}

/// `DELETE /plans/:id` — returns the removed record.
pub async fn delete_one<S: PlanStore>(
  State(service): Service<S>,
  Path(id): Path<Uuid>,
) -> Result<Json<PaymentPlan>, ApiError> {
  Ok(Json(service.delete_plan(id).await?))
}

// ─── Pay ──────────────────────────────────────────────────────────────────────

/// Outcome of `POST /plans/:id/pay`.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PayResponse {
  Paid { successor: Option<PaymentPlan> },
  AlreadyPaid,
}

impl From<MarkPaid> for PayResponse {
  fn from(outcome: MarkPaid) -> Self {
    match outcome {
      MarkPaid::Paid { successor } => PayResponse::Paid { successor },
      MarkPaid::AlreadyPaid => PayResponse::AlreadyPaid,
    }
  }
}

/// `POST /plans/:id/pay`
pub async fn pay<S: PlanStore>(
  State(service): Service<S>,
  Path(id): Path<Uuid>,
) -> Result<Json<PayResponse>, ApiError> {
  let outcome = service.mark_as_paid(id).await?;
  Ok(Json(outcome.into()))
}

// ─── Postpone ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PostponeBody {
  /// Days to move the due date by. Defaults to the server's configured value.
  pub days: Option<u32>,
}

/// `POST /plans/:id/postpone` — body `{"days":n}` is optional.
pub async fn postpone<S: PlanStore>(
  State(service): Service<S>,
  Path(id): Path<Uuid>,
  body: Option<Json<PostponeBody>>,
) -> Result<Json<PaymentPlan>, ApiError> {
  let days = body.and_then(|Json(b)| b.days);
  Ok(Json(service.postpone(id, days).await?))
}

// ─── Series ───────────────────────────────────────────────────────────────────

/// `DELETE /series/:id` — returns the removed records.
pub async fn delete_series<S: PlanStore>(
  State(service): Service<S>,
  Path(series_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentPlan>>, ApiError> {
  Ok(Json(service.delete_series(series_id).await?))
}

// ─── Plan set ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlanSetParams {
  pub category: Option<PlanCategory>,
}

/// `GET /plan-set[?category=general|analysis]`
pub async fn plan_set<S: PlanStore>(
  State(service): Service<S>,
  Query(params): Query<PlanSetParams>,
) -> Result<Json<Vec<PaymentPlan>>, ApiError> {
  let category = params.category.unwrap_or(PlanCategory::General);
  Ok(Json(service.plan_set(category).await?))
}

// ─── Cleanup ──────────────────────────────────────────────────────────────────

/// `POST /cleanup` — returns `{"removed": n}`.
pub async fn cleanup<S: PlanStore>(
  State(service): Service<S>,
) -> Result<impl IntoResponse, ApiError> {
  let removed = service.cleanup().await?;
  Ok(Json(json!({ "removed": removed })))
}
