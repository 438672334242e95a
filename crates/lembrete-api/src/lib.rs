//! JSON REST API for Lembrete.
//!
//! Exposes an axum [`Router`] backed by a [`PlanService`] over any
//! [`lembrete_core::store::PlanStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lembrete_api::api_router(service.clone()))
//! ```

pub mod appointments;
pub mod error;
pub mod plans;
pub mod reminders;
pub mod report;
pub mod schedule;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use lembrete_core::{service::PlanService, store::PlanStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Arc<PlanService<S>>) -> Router<()>
where
  S: PlanStore + 'static,
{
  Router::new()
    // Plans
    .route("/plans", get(plans::list::<S>).post(plans::create::<S>))
    .route("/plans/{id}", get(plans::get_one::<S>).delete(plans::delete_one::<S>))
    .route("/plans/{id}/pay", post(plans::pay::<S>))
    .route("/plans/{id}/postpone", post(plans::postpone::<S>))
    .route("/series/{id}", delete(plans::delete_series::<S>))
    .route("/plan-set", get(plans::plan_set::<S>))
    .route("/cleanup", post(plans::cleanup::<S>))
    // Reminders
    .route("/reminders", get(reminders::due::<S>))
    .route("/clients", get(reminders::clients::<S>))
    // Appointments
    .route(
      "/appointments",
      get(appointments::list::<S>).post(appointments::create::<S>),
    )
    .route("/appointments/{id}", delete(appointments::delete_one::<S>))
    .route("/appointments/{id}/paid", post(appointments::set_paid::<S>))
    // Report
    .route("/report", get(report::handler::<S>))
    // Schedule previews
    .route("/schedule/monthly", get(schedule::monthly::<S>))
    .route("/schedule/weekly", get(schedule::weekly::<S>))
    .with_state(service)
}
