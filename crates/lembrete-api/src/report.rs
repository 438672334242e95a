//! `GET /report[?from=..][&to=..][&client=..][&limit=..]`
//!
//! Returns the aggregates a document renderer needs: totals over every
//! matching appointment and a bounded list of entries.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use lembrete_core::{
  report::{ReportQuery, ReportSummary},
  service::PlanService,
  store::PlanStore,
};

use crate::error::ApiError;

pub async fn handler<S: PlanStore>(
  State(service): State<Arc<PlanService<S>>>,
  Query(query): Query<ReportQuery>,
) -> Result<Json<ReportSummary>, ApiError> {
  Ok(Json(service.report(&query).await?))
}
