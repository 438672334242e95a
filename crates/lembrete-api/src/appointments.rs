//! Handlers for `/appointments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/appointments` | Optional `?client=<name>` |
//! | `POST`   | `/appointments` | Body: [`NewAppointment`]; 201 + [`CreatedAppointment`] |
//! | `DELETE` | `/appointments/:id` | 404 if not found |
//! | `POST`   | `/appointments/:id/paid` | Body: `{"paid":true}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use lembrete_core::{
  appointment::{Appointment, NewAppointment},
  service::{CreatedAppointment, PlanService},
  store::PlanStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub client: Option<String>,
}

/// `GET /appointments[?client=<name>]`
pub async fn list<S: PlanStore>(
  State(service): State<Arc<PlanService<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
  let appointments = service.list_appointments(params.client.as_deref()).await?;
  Ok(Json(appointments))
}

/// `POST /appointments` — returns 201 with the appointment and any plan
/// installments its attached terms activated.
pub async fn create<S: PlanStore>(
  State(service): State<Arc<PlanService<S>>>,
  Json(body): Json<NewAppointment>,
) -> Result<impl IntoResponse, ApiError> {
  let created: CreatedAppointment = service.add_appointment(body).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /appointments/:id`
pub async fn delete_one<S: PlanStore>(
  State(service): State<Arc<PlanService<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
  Ok(Json(service.delete_appointment(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PaidBody {
  pub paid: bool,
}

/// `POST /appointments/:id/paid`
pub async fn set_paid<S: PlanStore>(
  State(service): State<Arc<PlanService<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PaidBody>,
) -> Result<Json<Appointment>, ApiError> {
  Ok(Json(service.set_appointment_paid(id, body.paid).await?))
}
