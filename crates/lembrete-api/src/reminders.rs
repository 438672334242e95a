//! Handlers for `/reminders` and `/clients`.
//!
//! `/reminders` lists the active installments whose notification is due on
//! `today` (defaults to the server's local date). `/clients` groups every
//! active installment under its client, most urgent first.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{Local, NaiveDate};
use lembrete_core::{
  plan::PaymentPlan,
  query::ClientGroup,
  service::PlanService,
  store::PlanStore,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ReminderParams {
  pub today: Option<NaiveDate>,
}

/// `GET /reminders[?today=YYYY-MM-DD]`
pub async fn due<S: PlanStore>(
  State(service): State<Arc<PlanService<S>>>,
  Query(params): Query<ReminderParams>,
) -> Result<Json<Vec<PaymentPlan>>, ApiError> {
  let today = params.today.unwrap_or_else(|| Local::now().date_naive());
  Ok(Json(service.due_notifications(today).await?))
}

/// `GET /clients`
pub async fn clients<S: PlanStore>(
  State(service): State<Arc<PlanService<S>>>,
) -> Result<Json<Vec<ClientGroup>>, ApiError> {
  Ok(Json(service.client_groups().await?))
}
