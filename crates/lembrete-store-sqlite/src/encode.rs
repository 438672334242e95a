//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates `YYYY-MM-DD`, amounts the
//! decimal's canonical string and UUIDs hyphenated lowercase strings.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, Utc};
use lembrete_core::{
  appointment::Appointment,
  plan::{Installment, NotificationTiming, PaymentPlan},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── NotificationTiming ──────────────────────────────────────────────────────

pub fn encode_timing(t: NotificationTiming) -> &'static str {
  match t {
    NotificationTiming::OnDueDate => "on_due_date",
    NotificationTiming::NextWeek => "next_week",
  }
}

pub fn decode_timing(s: &str) -> Result<NotificationTiming> {
  match s {
    "on_due_date" => Ok(NotificationTiming::OnDueDate),
    "next_week" => Ok(NotificationTiming::NextWeek),
    other => Err(Error::InvalidColumn {
      column: "notification_timing",
      value:  other.to_owned(),
    }),
  }
}

// ─── Installment ─────────────────────────────────────────────────────────────

pub fn decode_installment(
  cadence: &str,
  index: u32,
  total: u32,
  due_day: Option<u32>,
) -> Result<Installment> {
  match (cadence, due_day) {
    ("monthly", Some(due_day)) => Ok(Installment::Monthly {
      month: index,
      total_months: total,
      due_day,
    }),
    ("weekly", None) => Ok(Installment::Weekly { week: index, total_weeks: total }),
    (other, _) => Err(Error::InvalidColumn {
      column: "cadence",
      value:  other.to_owned(),
    }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from or written to a `payment_plans` row.
pub struct RawPlan {
  pub plan_id:             String,
  pub series_id:           String,
  pub client_name:         String,
  pub amount:              String,
  pub due_date:            String,
  pub created_at:          String,
  pub paid_at:             Option<String>,
  pub active:              bool,
  pub notification_timing: Option<String>,
  pub analysis_id:         Option<String>,
  pub cadence:             String,
  pub installment:         u32,
  pub total:               u32,
  pub due_day:             Option<u32>,
}

impl RawPlan {
  pub fn from_plan(plan: &PaymentPlan) -> Self {
    let due_day = match plan.installment {
      Installment::Monthly { due_day, .. } => Some(due_day),
      Installment::Weekly { .. } => None,
    };
    Self {
      plan_id: encode_uuid(plan.plan_id),
      series_id: encode_uuid(plan.series_id),
      client_name: plan.client_name.clone(),
      amount: encode_decimal(plan.amount),
      due_date: encode_date(plan.due_date),
      created_at: encode_dt(plan.created_at),
      paid_at: plan.paid_at.map(encode_dt),
      active: plan.active,
      notification_timing: plan.notification_timing.map(|t| encode_timing(t).to_owned()),
      analysis_id: plan.analysis_id.map(encode_uuid),
      cadence: plan.installment.cadence().to_owned(),
      installment: plan.installment.index(),
      total: plan.installment.total(),
      due_day,
    }
  }

  pub fn into_plan(self) -> Result<PaymentPlan> {
    Ok(PaymentPlan {
      plan_id:             decode_uuid(&self.plan_id)?,
      series_id:           decode_uuid(&self.series_id)?,
      client_name:         self.client_name,
      amount:              decode_decimal(&self.amount)?,
      due_date:            decode_date(&self.due_date)?,
      created_at:          decode_dt(&self.created_at)?,
      paid_at:             self.paid_at.as_deref().map(decode_dt).transpose()?,
      active:              self.active,
      notification_timing: self
        .notification_timing
        .as_deref()
        .map(decode_timing)
        .transpose()?,
      analysis_id:         self.analysis_id.as_deref().map(decode_uuid).transpose()?,
      installment:         decode_installment(
        &self.cadence,
        self.installment,
        self.total,
        self.due_day,
      )?,
    })
  }
}

/// Raw values read from or written to an `appointments` row.
pub struct RawAppointment {
  pub appointment_id: String,
  pub client_name:    String,
  pub date:           String,
  pub service_type:   String,
  pub amount:         String,
  pub paid:           bool,
  pub notes:          Option<String>,
  pub created_at:     String,
}

impl RawAppointment {
  pub fn from_appointment(a: &Appointment) -> Self {
    Self {
      appointment_id: encode_uuid(a.appointment_id),
      client_name:    a.client_name.clone(),
      date:           encode_date(a.date),
      service_type:   a.service_type.clone(),
      amount:         encode_decimal(a.amount),
      paid:           a.paid,
      notes:          a.notes.clone(),
      created_at:     encode_dt(a.created_at),
    }
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    Ok(Appointment {
      appointment_id: decode_uuid(&self.appointment_id)?,
      client_name:    self.client_name,
      date:           decode_date(&self.date)?,
      service_type:   self.service_type,
      amount:         decode_decimal(&self.amount)?,
      paid:           self.paid,
      notes:          self.notes,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}
