//! Appointments ("atendimentos") — the consultations a client is billed for.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::{NotificationTiming, PlanTerms};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
  pub appointment_id: Uuid,
  pub client_name:    String,
  pub date:           NaiveDate,
  /// Free-form service label, e.g. "tarot", "mapa astral".
  pub service_type:   String,
  pub amount:         Decimal,
  pub paid:           bool,
  pub notes:          Option<String>,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::service::PlanService::add_appointment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
  pub client_name:  String,
  pub date:         NaiveDate,
  pub service_type: String,
  pub amount:       Decimal,
  #[serde(default)]
  pub paid:         bool,
  #[serde(default)]
  pub notes:        Option<String>,
  /// Attaching terms activates a general payment plan starting on `date`.
  #[serde(default)]
  pub plan:         Option<AttachedPlan>,
}

/// Payment plan requested alongside an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedPlan {
  pub amount:              Decimal,
  #[serde(flatten)]
  pub terms:               PlanTerms,
  #[serde(default)]
  pub notification_timing: Option<NotificationTiming>,
}
