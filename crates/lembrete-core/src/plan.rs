//! Payment plans — one record per installment of a recurring obligation.
//!
//! A plan activation produces a *series* of installments sharing a
//! `series_id`. Monthly series are generated up front; weekly series start
//! with installment 1 and grow one record per payment.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Notification timing ─────────────────────────────────────────────────────

/// When an outstanding installment starts showing up as a reminder.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTiming {
  /// Remind from the due date onwards.
  #[default]
  OnDueDate,
  /// Remind from one week after the due date onwards.
  NextWeek,
}

// ─── Category ────────────────────────────────────────────────────────────────

/// Plans created from an analysis record are listed apart from the general
/// ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanCategory {
  General,
  Analysis,
}

// ─── Installment ─────────────────────────────────────────────────────────────

/// Cadence-specific position of a record within its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cadence", rename_all = "snake_case")]
pub enum Installment {
  Monthly {
    /// 1-based.
    month:        u32,
    total_months: u32,
    /// Requested day of month; short months clamp to their last day.
    due_day:      u32,
  },
  Weekly {
    /// 1-based.
    week:        u32,
    total_weeks: u32,
  },
}

impl Installment {
  pub fn index(&self) -> u32 {
    match self {
      Self::Monthly { month, .. } => *month,
      Self::Weekly { week, .. } => *week,
    }
  }

  pub fn total(&self) -> u32 {
    match self {
      Self::Monthly { total_months, .. } => *total_months,
      Self::Weekly { total_weeks, .. } => *total_weeks,
    }
  }

  pub fn is_last(&self) -> bool { self.index() >= self.total() }

  /// The same installment shape advanced to the next index.
  pub fn next(&self) -> Option<Self> {
    if self.is_last() {
      return None;
    }
    Some(match *self {
      Self::Monthly { month, total_months, due_day } => {
        Self::Monthly { month: month + 1, total_months, due_day }
      }
      Self::Weekly { week, total_weeks } => {
        Self::Weekly { week: week + 1, total_weeks }
      }
    })
  }

  /// Storage discriminant; matches the serde tag.
  pub fn cadence(&self) -> &'static str {
    match self {
      Self::Monthly { .. } => "monthly",
      Self::Weekly { .. } => "weekly",
    }
  }
}

// ─── PaymentPlan ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPlan {
  pub plan_id:             Uuid,
  /// Shared by every installment generated from one activation.
  pub series_id:           Uuid,
  pub client_name:         String,
  pub amount:              Decimal,
  pub due_date:            NaiveDate,
  pub created_at:          DateTime<Utc>,
  pub paid_at:             Option<DateTime<Utc>>,
  /// `true` while the installment is outstanding.
  pub active:              bool,
  pub notification_timing: Option<NotificationTiming>,
  /// Originating analysis, if any. Never dereferenced.
  pub analysis_id:         Option<Uuid>,
  #[serde(flatten)]
  pub installment:         Installment,
}

impl PaymentPlan {
  pub fn category(&self) -> PlanCategory {
    if self.analysis_id.is_some() {
      PlanCategory::Analysis
    } else {
      PlanCategory::General
    }
  }

  pub fn timing(&self) -> NotificationTiming {
    self.notification_timing.unwrap_or_default()
  }
}

// ─── NewPlan ─────────────────────────────────────────────────────────────────

/// Cadence and length requested when activating a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cadence", rename_all = "snake_case")]
pub enum PlanTerms {
  Monthly {
    total_months: u32,
    /// Falls back to the service default when absent.
    #[serde(default)]
    due_day:      Option<u32>,
  },
  Weekly {
    total_weeks: u32,
    /// Weekday name, e.g. `"sexta"` or `"friday"`.
    weekday:     String,
  },
}

/// Input to [`crate::lifecycle::activate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlan {
  pub client_name:         String,
  pub amount:              Decimal,
  pub start_date:          NaiveDate,
  #[serde(flatten)]
  pub terms:               PlanTerms,
  #[serde(default)]
  pub notification_timing: Option<NotificationTiming>,
  #[serde(default)]
  pub analysis_id:         Option<Uuid>,
}
