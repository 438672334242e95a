//! The `PlanStore` trait — the persistence contract.
//!
//! Backends load and save whole collections. There is no partial-update path:
//! [`crate::service::PlanService`] reads everything, transforms it in memory
//! and writes everything back. A save must replace the stored collection
//! atomically.

use std::future::Future;

use crate::{appointment::Appointment, plan::PaymentPlan};

/// Abstraction over a Lembrete storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PlanStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Payment plans ─────────────────────────────────────────────────────

  fn load_plans(
    &self,
  ) -> impl Future<Output = Result<Vec<PaymentPlan>, Self::Error>> + Send + '_;

  /// Replace the stored plans with `plans`.
  fn save_plans(
    &self,
    plans: Vec<PaymentPlan>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Appointments ──────────────────────────────────────────────────────

  fn load_appointments(
    &self,
  ) -> impl Future<Output = Result<Vec<Appointment>, Self::Error>> + Send + '_;

  /// Replace the stored appointments with `appointments`.
  fn save_appointments(
    &self,
    appointments: Vec<Appointment>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Both collections ──────────────────────────────────────────────────

  /// Replace both collections, or neither.
  ///
  /// The default writes appointments first and puts the previous ones back
  /// if the plans cannot be saved. Backends with transactions should
  /// override this with a single commit.
  fn save_all(
    &self,
    plans: Vec<PaymentPlan>,
    appointments: Vec<Appointment>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    async move {
      let previous = self.load_appointments().await?;
      self.save_appointments(appointments).await?;
      if let Err(e) = self.save_plans(plans).await {
        if let Err(restore) = self.save_appointments(previous).await {
          tracing::error!(error = %restore, "failed to restore appointments");
        }
        return Err(e);
      }
      Ok(())
    }
  }
}
