//! Schedule previews: the due dates a plan with the given terms would get,
//! without creating anything.
//!
//! | Method | Path | Query |
//! |--------|------|-------|
//! | `GET`  | `/schedule/monthly` | `start`, `months`, optional `due_day` |
//! | `GET`  | `/schedule/weekly`  | `start`, `weeks`, `weekday` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use lembrete_core::{
  lifecycle::check_period_count, schedule, service::PlanService, store::PlanStore,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct MonthlyParams {
  pub start:   NaiveDate,
  pub months:  u32,
  pub due_day: Option<u32>,
}

/// `GET /schedule/monthly?start=..&months=..[&due_day=..]`
pub async fn monthly<S: PlanStore>(
  State(service): State<Arc<PlanService<S>>>,
  Query(params): Query<MonthlyParams>,
) -> Result<Json<Vec<NaiveDate>>, ApiError> {
  check_period_count(params.months)?;
  let due_day = params.due_day.unwrap_or(service.defaults().due_day);
  Ok(Json(schedule::monthly_schedule(params.start, params.months, due_day)))
}

#[derive(Debug, Deserialize)]
pub struct WeeklyParams {
  pub start:   NaiveDate,
  pub weeks:   u32,
  pub weekday: String,
}

/// `GET /schedule/weekly?start=..&weeks=..&weekday=..`
pub async fn weekly<S: PlanStore>(
  State(_service): State<Arc<PlanService<S>>>,
  Query(params): Query<WeeklyParams>,
) -> Result<Json<Vec<NaiveDate>>, ApiError> {
  check_period_count(params.weeks)?;
  let weekday = schedule::parse_weekday(&params.weekday)?;
  Ok(Json(schedule::weekly_schedule(params.start, params.weeks, weekday)))
}
